//! Purchase path counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of engine activity since open
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineMetrics {
    /// Purchases that committed
    pub purchases_recorded: u64,
    /// Committed purchases that changed the level
    pub level_ups: u64,
    /// Applies retried after `ConcurrentModification`
    pub conflicts_retried: u64,
    /// Purchases that returned an error
    pub purchases_failed: u64,
    /// Progression records held
    pub records: u64,
    /// Registered users
    pub users: u64,
    /// Registered stores
    pub stores: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    purchases_recorded: AtomicU64,
    level_ups: AtomicU64,
    conflicts_retried: AtomicU64,
    purchases_failed: AtomicU64,
}

impl Counters {
    pub(crate) fn record_purchase(&self, leveled_up: bool) {
        self.purchases_recorded.fetch_add(1, Ordering::Relaxed);
        if leveled_up {
            self.level_ups.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_retry(&self) {
        self.conflicts_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.purchases_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, records: usize, users: usize, stores: usize) -> EngineMetrics {
        EngineMetrics {
            purchases_recorded: self.purchases_recorded.load(Ordering::Relaxed),
            level_ups: self.level_ups.load(Ordering::Relaxed),
            conflicts_retried: self.conflicts_retried.load(Ordering::Relaxed),
            purchases_failed: self.purchases_failed.load(Ordering::Relaxed),
            records: records as u64,
            users: users as u64,
            stores: stores as u64,
        }
    }
}
