//! Output formatting: human-readable tables or JSON.

use crate::state::Output;
use starling::{Level, StickerView};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Render a command result.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => match output {
            Output::Ok => String::new(),
            other => serde_json::to_string_pretty(other)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        },
        OutputMode::Human => format_human(output),
    }
}

/// Render an error.
pub fn format_error(err: &starling::Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::json!({ "error": err.to_string() }).to_string(),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Receipts(receipts) => receipts
            .iter()
            .map(|r| {
                let mut line = format!(
                    "{} @ {}: {} star{}, {}",
                    r.user_id,
                    r.store_id,
                    r.star_count,
                    if r.star_count == 1 { "" } else { "s" },
                    r.level
                );
                if r.leveled_up {
                    line.push_str(&format!("  ** leveled up to {} **", r.level));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Record(record) => format!(
            "stars: {}\nlevel: {}\nlast_updated: {}",
            record.star_count,
            record.level,
            record.last_updated.to_rfc3339()
        ),
        Output::Records(rows) if rows.is_empty() => "(empty)".to_string(),
        Output::Records(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "{}) {}  {} stars  {}",
                    i + 1,
                    row.store_id,
                    row.record.star_count,
                    row.record.level
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Sticker(view) => sticker_line(view),
        Output::Stickers(views) if views.is_empty() => "(empty)".to_string(),
        Output::Stickers(views) => views
            .iter()
            .map(sticker_line)
            .collect::<Vec<_>>()
            .join("\n"),
        Output::User(user) => format!(
            "id: {}\nusername: {}\ncreated_at: {}",
            user.user_id,
            user.username,
            user.created_at.to_rfc3339()
        ),
        Output::Store(store) => format!(
            "id: {}\nname: {}\nlocation: {}",
            store.store_id, store.name, store.location
        ),
        Output::Stores(stores) if stores.is_empty() => "(empty)".to_string(),
        Output::Stores(stores) => stores
            .iter()
            .map(|s| format!("{}  {} ({})", s.store_id, s.name, s.location))
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Thresholds(table) => table
            .entries()
            .iter()
            .map(|e| match e.next_level {
                Some(next) => format!(
                    "{:<9} -> {:<9} at {} stars",
                    e.level.as_str(),
                    next.as_str(),
                    e.stars_required
                ),
                None => format!("{:<9} (top level)", e.level.as_str()),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Info(info) => format!(
            "path: {}\ndurability: {}\nephemeral: {}\nwal entries replayed: {}\nlevels reconciled: {}\n\
             purchases: {}\nlevel-ups: {}\nretries: {}\nfailed: {}\nrecords: {}\nusers: {}\nstores: {}",
            if info.path.is_empty() { "(none)" } else { info.path.as_str() },
            info.durability,
            info.ephemeral,
            info.wal_entries_replayed,
            info.levels_reconciled,
            info.metrics.purchases_recorded,
            info.metrics.level_ups,
            info.metrics.conflicts_retried,
            info.metrics.purchases_failed,
            info.metrics.records,
            info.metrics.users,
            info.metrics.stores
        ),
        Output::Ok => "OK".to_string(),
    }
}

fn sticker_line(view: &StickerView) -> String {
    let name = match (&view.store_name, &view.location) {
        (Some(name), Some(location)) => format!("{} ({})", name, location),
        (Some(name), None) => name.clone(),
        _ => view.store_id.to_string(),
    };
    format!("{:<9} {:>4} stars  {}", badge(view.level), view.star_count, name)
}

fn badge(level: Level) -> String {
    format!("[{}]", level)
}
