//! ArgMatches → Command conversion, and REPL meta-commands.
//!
//! Meta-commands (`help`, `clear`, `quit`) are recognised on the raw line
//! before clap sees it; everything else becomes a [`Command`].

use clap::ArgMatches;
use starling::StoreId;

use crate::state::Command;

/// Most purchases one `purchase -n` may record
pub const MAX_PURCHASE_COUNT: u32 = 10_000;

/// REPL meta-commands.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Help { command: Option<String> },
    Quit,
    Clear,
}

/// Check for REPL meta-commands before delegating to clap.
///
/// Returns `Some(MetaCommand)` if the line is a meta-command, `None` otherwise.
pub fn check_meta_command(line: &str) -> Option<MetaCommand> {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next()?;

    match cmd {
        "quit" | "exit" => Some(MetaCommand::Quit),
        "clear" => Some(MetaCommand::Clear),
        "help" => {
            let command = parts
                .next()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Some(MetaCommand::Help { command })
        }
        _ => None,
    }
}

/// Convert clap ArgMatches into a Command.
pub fn matches_to_command(matches: &ArgMatches) -> Result<Command, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    let cmd = match sub_name {
        "purchase" => {
            let count = m
                .get_one::<String>("count")
                .map(|s| s.parse::<u32>())
                .transpose()
                .map_err(|e| format!("Invalid count: {}", e))?
                .unwrap_or(1);
            if count == 0 || count > MAX_PURCHASE_COUNT {
                return Err(format!(
                    "Invalid count: must be between 1 and {}",
                    MAX_PURCHASE_COUNT
                ));
            }
            Command::Purchase {
                user: required(m, "user")?.into(),
                store: required(m, "store")?.into(),
                count,
            }
        }
        "progress" => Command::Progress {
            user: required(m, "user")?.into(),
            store: required(m, "store")?.into(),
        },
        "list" => Command::List {
            user: required(m, "user")?.into(),
        },
        "sticker" => Command::Sticker {
            user: required(m, "user")?.into(),
            store: required(m, "store")?.into(),
        },
        "stickers" => Command::Stickers {
            user: required(m, "user")?.into(),
        },
        "user" => parse_user(m)?,
        "store" => parse_store(m)?,
        "stores" => Command::Stores,
        "thresholds" => Command::Thresholds,
        "info" => Command::Info,
        "flush" => Command::Flush,
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(cmd)
}

fn required(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn parse_user(matches: &ArgMatches) -> Result<Command, String> {
    let (sub, m) = matches.subcommand().ok_or("No user subcommand")?;
    match sub {
        "add" => Ok(Command::UserAdd {
            username: required(m, "username")?,
        }),
        "get" => Ok(Command::UserGet {
            user: required(m, "user")?,
        }),
        other => Err(format!("Unknown user subcommand: {}", other)),
    }
}

fn parse_store(matches: &ArgMatches) -> Result<Command, String> {
    let (sub, m) = matches.subcommand().ok_or("No store subcommand")?;
    match sub {
        "add" => Ok(Command::StoreAdd {
            name: required(m, "name")?,
            location: required(m, "location")?,
            id: m.get_one::<String>("id").map(|s| StoreId::from(s.as_str())),
        }),
        "get" => Ok(Command::StoreGet {
            store: required(m, "store")?.into(),
        }),
        other => Err(format!("Unknown store subcommand: {}", other)),
    }
}
