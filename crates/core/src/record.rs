//! Progression record types

use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock timestamp used for `last_updated` and registration times
pub type Timestamp = DateTime<Utc>;

/// Per-(user, store) progression state, the "sticker"
///
/// `level` is always the level the threshold table assigns to `star_count`.
/// Records are only ever produced by [`SatisfactionRecord::zero`] and the
/// progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionRecord {
    /// Stars accumulated at this store (never decreases)
    pub star_count: u64,
    /// Current level
    pub level: Level,
    /// Time of the last mutation
    pub last_updated: Timestamp,
}

impl SatisfactionRecord {
    /// The record a first purchase starts from
    pub fn zero(level: Level, now: Timestamp) -> Self {
        Self {
            star_count: 0,
            level,
            last_updated: now,
        }
    }
}

/// A stored value paired with its per-key version
///
/// Versions start at 1 when a record is created and grow by one per committed
/// write. WAL replay keeps the highest version seen for each key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// The stored value
    pub value: T,
    /// Per-key version
    pub version: u64,
}

impl<T> Versioned<T> {
    /// Wrap a value at an explicit version
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }

    /// The value that replaces this one, one version later
    pub fn successor(&self, value: T) -> Self {
        Self {
            value,
            version: self.version + 1,
        }
    }

    /// Discard the version
    pub fn into_value(self) -> T {
        self.value
    }
}
