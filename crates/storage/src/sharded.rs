//! Sharded record storage
//!
//! DashMap keyed by user, FxHashMap of stores within each shard.
//!
//! # Design
//!
//! - DashMap: lock-striped by user, concurrent readers
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - Per-user shards: purchases of different users never contend
//!
//! # Atomic Updates
//!
//! [`ShardedStore::update`] and [`ShardedStore::get_or_insert_with`] run the
//! caller's closure while holding the shard's write guard. Whatever the closure
//! does (compute the next record, append it to the WAL) happens-before any
//! other access to the same key, and the new record only becomes visible if
//! the closure succeeds. Closures must not call back into the same store.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use starling_core::{SatisfactionRecord, StoreId, UserId, Versioned};
use tracing::trace;

/// A record as held in memory
pub type StoredRecord = Versioned<SatisfactionRecord>;

/// Per-user shard containing that user's records
#[derive(Debug, Default)]
pub struct Shard {
    /// Records keyed by store
    pub(crate) data: FxHashMap<StoreId, StoredRecord>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of records in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Sharded storage - DashMap by UserId, HashMap within
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get()/list_user(): shared read guard on the user's shard
/// - update()/get_or_insert_with(): exclusive guard on the user's shard
/// - Different users only contend when DashMap stripes them together
pub struct ShardedStore {
    /// Per-user shards using DashMap
    shards: DashMap<UserId, Shard>,
}

impl ShardedStore {
    /// Create new sharded store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
        }
    }

    /// Get total number of records across all shards
    pub fn total_entries(&self) -> usize {
        self.shards.iter().map(|entry| entry.value().len()).sum()
    }

    /// Get a record
    #[inline]
    pub fn get(&self, user_id: &UserId, store_id: &StoreId) -> Option<StoredRecord> {
        self.shards
            .get(user_id)
            .and_then(|shard| shard.data.get(store_id).cloned())
    }

    /// Return the existing record, or insert the one `make` produces
    ///
    /// `make` runs under the shard's write guard and only when the key is
    /// absent. If it fails nothing is inserted. The flag is true when this
    /// call created the record.
    pub fn get_or_insert_with<E>(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        make: impl FnOnce() -> Result<StoredRecord, E>,
    ) -> Result<(StoredRecord, bool), E> {
        let record = match self.shards.entry(user_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let shard = occupied.get_mut();
                if let Some(existing) = shard.data.get(store_id) {
                    return Ok((existing.clone(), false));
                }
                let record = make()?;
                shard.data.insert(store_id.clone(), record.clone());
                record
            }
            // The vacant entry holds the guard; the shard only appears on success
            Entry::Vacant(vacant) => {
                let record = make()?;
                let mut shard = Shard::new();
                shard.data.insert(store_id.clone(), record.clone());
                vacant.insert(shard);
                record
            }
        };
        trace!(user = %user_id, store = %store_id, "record created");
        Ok((record, true))
    }

    /// Replace a record with whatever `f` derives from it
    ///
    /// `f` runs under the shard's write guard. Returns `Ok(None)` if the key
    /// does not exist; if `f` fails the record is left untouched.
    pub fn update<E>(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        f: impl FnOnce(&StoredRecord) -> Result<StoredRecord, E>,
    ) -> Result<Option<StoredRecord>, E> {
        let mut shard = match self.shards.get_mut(user_id) {
            Some(shard) => shard,
            None => return Ok(None),
        };
        let slot = match shard.data.get_mut(store_id) {
            Some(slot) => slot,
            None => return Ok(None),
        };

        let next = f(slot)?;
        *slot = next.clone();
        Ok(Some(next))
    }

    /// Install a record unless a newer version is already held
    ///
    /// Used by WAL replay, where entries for one key may arrive out of
    /// version order. Returns true if the record was installed.
    pub fn put_if_newer(&self, user_id: &UserId, store_id: &StoreId, record: StoredRecord) -> bool {
        let mut shard = self.shards.entry(user_id.clone()).or_default();
        match shard.data.get(store_id) {
            Some(existing) if existing.version >= record.version => false,
            _ => {
                shard.data.insert(store_id.clone(), record);
                true
            }
        }
    }

    /// Rewrite records in place
    ///
    /// `f` returns true when it changed the record. Returns the number of
    /// records changed. Not atomic across users.
    pub fn rewrite_all(&self, mut f: impl FnMut(&UserId, &StoreId, &mut StoredRecord) -> bool) -> usize {
        let mut changed = 0;
        for mut entry in self.shards.iter_mut() {
            let (user_id, shard) = entry.pair_mut();
            for (store_id, record) in shard.data.iter_mut() {
                if f(user_id, store_id, record) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// List all records of a user
    ///
    /// Requires collect + sort; listings are not on the purchase path.
    ///
    /// # Returns
    ///
    /// Vector of (StoreId, StoredRecord) pairs, sorted by store id
    pub fn list_user(&self, user_id: &UserId) -> Vec<(StoreId, StoredRecord)> {
        self.shards
            .get(user_id)
            .map(|shard| {
                let mut results: Vec<_> = shard
                    .data
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();

                results.sort_by(|(a, _), (b, _)| a.cmp(b));
                results
            })
            .unwrap_or_default()
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShardedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedStore")
            .field("users", &self.shards.len())
            .field("total_entries", &self.total_entries())
            .finish()
    }
}
