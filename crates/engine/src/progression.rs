//! Progression engine
//!
//! Pure decision logic: given the current record and the threshold table,
//! compute the record after one purchase and whether it levelled up. No
//! storage, no clock reads, no logging; the store runs this as the transform
//! of an atomic apply and may run it more than once.

use starling_core::{SatisfactionRecord, ThresholdTable, Timestamp};

/// Result of applying one purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// Record after the purchase
    pub next: SatisfactionRecord,
    /// Whether the purchase moved the record to a new level
    pub leveled_up: bool,
}

/// Apply one purchase to `current`
///
/// Adds exactly one star. If the new count reaches the threshold of the
/// current level's row and that row has a next level, the record moves up
/// one level. A level the table does not contain never transitions.
pub fn apply_purchase(
    current: &SatisfactionRecord,
    thresholds: &ThresholdTable,
    now: Timestamp,
) -> PurchaseOutcome {
    let star_count = current.star_count.saturating_add(1);

    let promoted = thresholds.entry(current.level).and_then(|entry| {
        entry
            .next_level
            .filter(|_| star_count >= u64::from(entry.stars_required))
    });

    PurchaseOutcome {
        next: SatisfactionRecord {
            star_count,
            level: promoted.unwrap_or(current.level),
            last_updated: now,
        },
        leveled_up: promoted.is_some(),
    }
}
