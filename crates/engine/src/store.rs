//! Progress store backed by the sharded map and the WAL
//!
//! # Commit Sequence
//!
//! ```text
//! apply_atomic(user, store):
//!   lock user shard (exclusive)
//!     ctx.check()              <- cancelled/expired: nothing changes
//!     next = transform(current)
//!     ctx.check()              <- last chance before commit
//!     WAL.append(PutRecord)    <- DurabilityMode controls fsync
//!     publish next
//!   unlock
//! ```
//!
//! Lock order is always shard, then WAL. The WAL mutex is never held while a
//! shard guard is requested.

use parking_lot::Mutex;
use starling_core::{
    Error, OpContext, ProgressStore, Result, SatisfactionRecord, StoreId, UserId, Versioned,
};
use starling_durability::{Wal, WalEntry};
use starling_storage::{ShardedStore, StoredRecord};
use std::sync::Arc;
use tracing::{debug, trace};

/// Optional shared handle to the WAL
///
/// Empty for ephemeral databases and `DurabilityMode::None`; appends are then
/// no-ops.
#[derive(Debug, Clone, Default)]
pub struct SharedWal(Option<Arc<Mutex<Wal>>>);

impl SharedWal {
    /// A handle that logs nothing
    pub fn disabled() -> Self {
        Self(None)
    }

    /// Share an open WAL
    pub fn new(wal: Wal) -> Self {
        Self(Some(Arc::new(Mutex::new(wal))))
    }

    /// Whether appends reach a file
    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Append one entry
    pub fn append(&self, entry: &WalEntry) -> Result<()> {
        match &self.0 {
            Some(wal) => wal.lock().append(entry),
            None => Ok(()),
        }
    }

    /// Force pending appends to disk
    pub fn flush(&self) -> Result<()> {
        match &self.0 {
            Some(wal) => wal.lock().flush(),
            None => Ok(()),
        }
    }

    /// Entries appended since open
    pub fn appended(&self) -> u64 {
        self.0.as_ref().map_or(0, |wal| wal.lock().appended())
    }
}

/// The production [`ProgressStore`]
///
/// Records live in a [`ShardedStore`]; every new version is appended to the
/// WAL under the shard guard before it is published.
#[derive(Debug)]
pub struct PersistentStore {
    records: ShardedStore,
    wal: SharedWal,
}

impl PersistentStore {
    /// Create a store over already-recovered records
    pub fn new(records: ShardedStore, wal: SharedWal) -> Self {
        Self { records, wal }
    }

    /// A store with no WAL
    pub fn in_memory() -> Self {
        Self::new(ShardedStore::new(), SharedWal::disabled())
    }

    /// Underlying record map
    pub fn records(&self) -> &ShardedStore {
        &self.records
    }

    fn log(&self, user_id: &UserId, store_id: &StoreId, record: &StoredRecord) -> Result<()> {
        self.wal.append(&WalEntry::PutRecord {
            user_id: user_id.clone(),
            store_id: store_id.clone(),
            record: record.value.clone(),
            version: record.version,
        })
    }
}

impl ProgressStore for PersistentStore {
    fn get(&self, user_id: &UserId, store_id: &StoreId) -> Result<Option<StoredRecord>> {
        Ok(self.records.get(user_id, store_id))
    }

    fn get_or_create(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        initial: SatisfactionRecord,
        ctx: &OpContext,
    ) -> Result<StoredRecord> {
        ctx.check()?;
        let (record, created) = self.records.get_or_insert_with(user_id, store_id, || {
            ctx.check()?;
            let record = Versioned::new(initial, 1);
            self.log(user_id, store_id, &record)?;
            Ok::<_, Error>(record)
        })?;
        if created {
            debug!(user = %user_id, store = %store_id, "progress record created");
        }
        Ok(record)
    }

    fn apply_atomic(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        ctx: &OpContext,
        transform: &mut dyn FnMut(&SatisfactionRecord) -> SatisfactionRecord,
    ) -> Result<StoredRecord> {
        ctx.check()?;
        let applied = self.records.update(user_id, store_id, |current| {
            ctx.check()?;
            let next = transform(&current.value);
            if next.star_count < current.value.star_count {
                return Err(Error::InvalidInput(format!(
                    "star count for user {} at store {} would drop from {} to {}",
                    user_id, store_id, current.value.star_count, next.star_count
                )));
            }
            ctx.check()?;
            let next = current.successor(next);
            self.log(user_id, store_id, &next)?;
            Ok(next)
        })?;

        match applied {
            Some(record) => {
                trace!(
                    user = %user_id,
                    store = %store_id,
                    version = record.version,
                    stars = record.value.star_count,
                    "record applied"
                );
                Ok(record)
            }
            None => Err(Error::NotFound {
                user_id: user_id.clone(),
                store_id: store_id.clone(),
            }),
        }
    }

    fn list_for_user(&self, user_id: &UserId) -> Result<Vec<(StoreId, StoredRecord)>> {
        Ok(self.records.list_user(user_id))
    }

    fn record_count(&self) -> usize {
        self.records.total_entries()
    }
}
