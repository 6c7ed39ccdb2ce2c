//! Storage contract for progression records

use crate::context::OpContext;
use crate::error::Result;
use crate::record::{SatisfactionRecord, Versioned};
use crate::types::{StoreId, UserId};

/// Durable, linearizable storage of [`SatisfactionRecord`]s keyed by
/// (user, store)
///
/// # Atomicity
///
/// `apply_atomic` is the only way to change a record. It must behave as a
/// single indivisible read-modify-write with respect to every other
/// `apply_atomic` on the same key: N concurrent applies of "+1" always add N.
///
/// # Transform Purity
///
/// The transform may be invoked more than once if the implementation retries
/// internally. It must depend only on its argument and must not perform I/O.
pub trait ProgressStore: Send + Sync {
    /// Current record for the pair, if one has been created
    fn get(&self, user_id: &UserId, store_id: &StoreId) -> Result<Option<Versioned<SatisfactionRecord>>>;

    /// Return the record for the pair, creating `initial` if none exists
    ///
    /// Concurrent callers for the same key all observe the same single
    /// record; at most one creation is persisted.
    fn get_or_create(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        initial: SatisfactionRecord,
        ctx: &OpContext,
    ) -> Result<Versioned<SatisfactionRecord>>;

    /// Atomically replace the record with `transform(current)`
    ///
    /// Returns the persisted record on success.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the pair has no record
    /// - `ConcurrentModification` if the write could not be made atomic;
    ///   the caller may retry
    /// - `StorageUnavailable` on I/O failure; nothing was applied
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` fired before the commit
    fn apply_atomic(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        ctx: &OpContext,
        transform: &mut dyn FnMut(&SatisfactionRecord) -> SatisfactionRecord,
    ) -> Result<Versioned<SatisfactionRecord>>;

    /// All records of a user, sorted by store id
    fn list_for_user(&self, user_id: &UserId) -> Result<Vec<(StoreId, Versioned<SatisfactionRecord>)>>;

    /// Number of records held
    fn record_count(&self) -> usize;
}
