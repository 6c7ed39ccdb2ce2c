//! Database: the progress store, the directory and the WAL behind one handle
//!
//! # Purchase Flow
//!
//! ```text
//! record_purchase(user, store):
//!   get_or_create(user, store, zero record)    <- first purchase creates
//!   retry(max_attempts):
//!     apply_atomic(user, store, apply_purchase) <- one star, maybe a level
//!   -> PurchaseReceipt
//! ```
//!
//! # Open Sequence
//!
//! 1. Create the data directory
//! 2. Replay `starling.wal` into the record map and directory
//! 3. Reconcile every record's level against the active threshold table
//! 4. Open the WAL for appending (unless durability is `None`)
//!
//! Ephemeral databases skip all of it and touch no files.

use crate::config::StarlingConfig;
use crate::metrics::{Counters, EngineMetrics};
use crate::progression::apply_purchase;
use crate::retry::RetryPolicy;
use crate::store::{PersistentStore, SharedWal};
use chrono::Utc;
use serde::Serialize;
use starling_core::{
    Error, Level, OpContext, ProgressStore, Result, SatisfactionRecord, StoreId, StoreInfo,
    ThresholdTable, UserId, UserInfo, Versioned,
};
use starling_durability::{replay, DurabilityMode, RecoveryStats, Wal, WalEntry, WAL_FILENAME};
use starling_storage::{Directory, ShardedStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a committed purchase produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    /// Purchasing user
    pub user_id: UserId,
    /// Store the purchase was made at
    pub store_id: StoreId,
    /// Stars after the purchase
    pub star_count: u64,
    /// Level after the purchase
    pub level: Level,
    /// Whether this purchase changed the level
    pub leveled_up: bool,
    /// Record version written by this purchase
    pub version: u64,
}

/// A progression record joined with its store's directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StickerView {
    /// Store the sticker belongs to
    pub store_id: StoreId,
    /// Store name, if the store is registered
    pub store_name: Option<String>,
    /// Store location, if the store is registered
    pub location: Option<String>,
    /// Stars accumulated
    pub star_count: u64,
    /// Current level
    pub level: Level,
}

/// What opening the database recovered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// WAL replay statistics
    pub wal: RecoveryStats,
    /// Records whose level was corrected to match the threshold table
    pub levels_reconciled: u64,
}

/// Main database handle
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Database {
    data_dir: PathBuf,
    store: Arc<dyn ProgressStore>,
    directory: Directory,
    wal: SharedWal,
    thresholds: Arc<ThresholdTable>,
    retry: RetryPolicy,
    request_timeout: Option<Duration>,
    mode: DurabilityMode,
    ephemeral: bool,
    recovery: RecoveryReport,
    counters: Counters,
}

impl Database {
    /// Open (or create) a database at `path` with the default configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        DatabaseBuilder::new().path(path).open()
    }

    /// Open a database with no files at all
    pub fn ephemeral() -> Result<Self> {
        DatabaseBuilder::new().open()
    }

    /// Start configuring a database
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    /// Record one purchase under the default request deadline
    pub fn record_purchase(&self, user_id: &UserId, store_id: &StoreId) -> Result<PurchaseReceipt> {
        let ctx = match self.request_timeout {
            Some(timeout) => OpContext::with_timeout(timeout),
            None => OpContext::background(),
        };
        self.record_purchase_with(user_id, store_id, &ctx)
    }

    /// Record one purchase under an explicit context
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` once the retry policy is exhausted
    /// - `StorageUnavailable` if the WAL append fails; nothing changes
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` fires before commit
    pub fn record_purchase_with(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
        ctx: &OpContext,
    ) -> Result<PurchaseReceipt> {
        match self.purchase(user_id, store_id, ctx) {
            Ok(receipt) => {
                self.counters.record_purchase(receipt.leveled_up);
                Ok(receipt)
            }
            Err(e) => {
                self.counters.record_failure();
                if e.is_cancellation() {
                    debug!(user = %user_id, store = %store_id, error = %e, "purchase abandoned");
                } else {
                    warn!(user = %user_id, store = %store_id, error = %e, "purchase failed");
                }
                Err(e)
            }
        }
    }

    fn purchase(&self, user_id: &UserId, store_id: &StoreId, ctx: &OpContext) -> Result<PurchaseReceipt> {
        let initial = SatisfactionRecord::zero(self.thresholds.first_level(), Utc::now());
        self.store.get_or_create(user_id, store_id, initial, ctx)?;

        let thresholds = Arc::clone(&self.thresholds);
        let mut leveled_up = false;
        let record = self.retry.run(ctx, |attempt| {
            if attempt > 1 {
                self.counters.record_retry();
            }
            self.store.apply_atomic(user_id, store_id, ctx, &mut |current| {
                let outcome = apply_purchase(current, &thresholds, Utc::now());
                leveled_up = outcome.leveled_up;
                outcome.next
            })
        })?;

        debug!(
            user = %user_id,
            store = %store_id,
            stars = record.value.star_count,
            level = %record.value.level,
            "level evaluated"
        );
        if leveled_up {
            info!(
                user = %user_id,
                store = %store_id,
                level = %record.value.level,
                stars = record.value.star_count,
                "sticker leveled up"
            );
        }

        Ok(PurchaseReceipt {
            user_id: user_id.clone(),
            store_id: store_id.clone(),
            star_count: record.value.star_count,
            level: record.value.level,
            leveled_up,
            version: record.version,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Record for the pair; never creates one
    pub fn get_progress(&self, user_id: &UserId, store_id: &StoreId) -> Result<SatisfactionRecord> {
        self.store
            .get(user_id, store_id)?
            .map(Versioned::into_value)
            .ok_or_else(|| Error::NotFound {
                user_id: user_id.clone(),
                store_id: store_id.clone(),
            })
    }

    /// Record for the pair with its version
    pub fn get_versioned(
        &self,
        user_id: &UserId,
        store_id: &StoreId,
    ) -> Result<Option<Versioned<SatisfactionRecord>>> {
        self.store.get(user_id, store_id)
    }

    /// Every record of a user, sorted by store id; empty for unknown users
    pub fn list_progress(&self, user_id: &UserId) -> Result<Vec<(StoreId, SatisfactionRecord)>> {
        Ok(self
            .store
            .list_for_user(user_id)?
            .into_iter()
            .map(|(store_id, record)| (store_id, record.value))
            .collect())
    }

    /// The pair's record joined with the store directory
    pub fn sticker(&self, user_id: &UserId, store_id: &StoreId) -> Result<StickerView> {
        let record = self.get_progress(user_id, store_id)?;
        Ok(self.view(store_id.clone(), record))
    }

    /// Every sticker of a user, sorted by store id
    pub fn stickers(&self, user_id: &UserId) -> Result<Vec<StickerView>> {
        Ok(self
            .list_progress(user_id)?
            .into_iter()
            .map(|(store_id, record)| self.view(store_id, record))
            .collect())
    }

    fn view(&self, store_id: StoreId, record: SatisfactionRecord) -> StickerView {
        let info = self.directory.store(&store_id);
        StickerView {
            store_name: info.as_ref().map(|s| s.name.clone()),
            location: info.map(|s| s.location),
            store_id,
            star_count: record.star_count,
            level: record.level,
        }
    }

    /// The active threshold table
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    // ========================================================================
    // Directory
    // ========================================================================

    /// Register a user, or return the one already holding `username`
    pub fn register_user(&self, username: &str) -> Result<UserInfo> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("username must not be empty".into()));
        }
        let (info, created) = self.directory.register_user_with(username, || {
            let info = UserInfo {
                user_id: UserId::new(),
                username: username.to_string(),
                created_at: Utc::now(),
            };
            self.wal.append(&WalEntry::RegisterUser { user: info.clone() })?;
            Ok::<_, Error>(info)
        })?;
        if created {
            debug!(user = %info.user_id, username = %info.username, "user registered");
        }
        Ok(info)
    }

    /// Register a store under a fresh id
    pub fn register_store(&self, name: &str, location: &str) -> Result<StoreInfo> {
        let info = StoreInfo::new(StoreId::new(), name.trim(), location.trim());
        self.put_store(info.clone())?;
        Ok(info)
    }

    /// Insert or replace a store under a caller-chosen id
    pub fn put_store(&self, info: StoreInfo) -> Result<()> {
        if info.store_id.as_str().is_empty() {
            return Err(Error::InvalidInput("store id must not be empty".into()));
        }
        if info.name.trim().is_empty() {
            return Err(Error::InvalidInput("store name must not be empty".into()));
        }
        let store_id = info.store_id.clone();
        self.directory.put_store_with(info, |store| {
            self.wal.append(&WalEntry::RegisterStore {
                store: store.clone(),
            })
        })?;
        debug!(store = %store_id, "store registered");
        Ok(())
    }

    /// Look up a user
    pub fn user(&self, user_id: &UserId) -> Result<UserInfo> {
        self.directory
            .user(user_id)
            .ok_or_else(|| Error::UnknownUser(user_id.clone()))
    }

    /// Look up a user by username
    pub fn user_by_name(&self, username: &str) -> Option<UserInfo> {
        self.directory.user_by_name(username)
    }

    /// Look up a store
    pub fn store(&self, store_id: &StoreId) -> Result<StoreInfo> {
        self.directory
            .store(store_id)
            .ok_or_else(|| Error::UnknownStore(store_id.clone()))
    }

    /// All stores, sorted by id
    pub fn stores(&self) -> Vec<StoreInfo> {
        self.directory.stores()
    }

    // ========================================================================
    // Lifecycle and introspection
    // ========================================================================

    /// Activity counters and sizes
    pub fn metrics(&self) -> EngineMetrics {
        self.counters.snapshot(
            self.store.record_count(),
            self.directory.user_count(),
            self.directory.store_count(),
        )
    }

    /// What the last open recovered
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    /// Force buffered WAL appends to disk
    pub fn flush(&self) -> Result<()> {
        self.wal.flush()
    }

    /// Flush and log shutdown; the handle stays usable
    pub fn shutdown(&self) -> Result<()> {
        self.flush()?;
        info!(
            path = %self.data_dir.display(),
            wal_entries = self.wal.appended(),
            "database shut down"
        );
        Ok(())
    }

    /// Database directory; empty for ephemeral databases
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Durability mode in effect
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Whether this database has no files
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Retry policy for contended purchases
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.wal.flush() {
            warn!(error = %e, "WAL flush on drop failed");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("mode", &self.mode)
            .field("ephemeral", &self.ephemeral)
            .field("levels", &self.thresholds.len())
            .finish()
    }
}

/// Builder for [`Database`]
///
/// ```ignore
/// let db = Database::builder()
///     .path("./stickers")
///     .strict()
///     .open()?;
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    path: Option<PathBuf>,
    config: StarlingConfig,
    durability: Option<DurabilityMode>,
    thresholds: Option<ThresholdTable>,
    retry: Option<RetryPolicy>,
    request_timeout: Option<Option<Duration>>,
    store: Option<Arc<dyn ProgressStore>>,
}

impl DatabaseBuilder {
    /// A builder with the default configuration and no path
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database directory; without one the database is ephemeral
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Take defaults from a configuration; explicit builder settings win
    pub fn config(mut self, config: StarlingConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the durability mode
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = Some(mode);
        self
    }

    /// fsync every WAL append
    pub fn strict(self) -> Self {
        self.durability(DurabilityMode::Strict)
    }

    /// fsync every 100ms or 1000 appends
    pub fn buffered(self) -> Self {
        self.durability(DurabilityMode::buffered_default())
    }

    /// Keep a WAL-less database, even with a path
    pub fn no_durability(self) -> Self {
        self.durability(DurabilityMode::None)
    }

    /// Override the threshold table
    pub fn thresholds(mut self, table: ThresholdTable) -> Self {
        self.thresholds = Some(table);
        self
    }

    /// Override the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override the default request deadline (`None` disables it)
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Use a caller-supplied progress store; only valid without a path
    pub fn with_store(mut self, store: Arc<dyn ProgressStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Open the database
    ///
    /// # Errors
    ///
    /// - `InvalidThresholdConfig` if the threshold table is invalid
    /// - `InvalidConfig` for other bad settings
    /// - `StorageUnavailable` / `Corruption` if recovery fails
    pub fn open(self) -> Result<Database> {
        self.config.validate()?;
        let thresholds = match self.thresholds {
            Some(table) => table,
            None => self.config.threshold_table()?,
        };
        let retry = self.retry.unwrap_or(self.config.retry);
        if retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        let request_timeout = self
            .request_timeout
            .unwrap_or_else(|| self.config.request_timeout());

        let Some(data_dir) = self.path else {
            let store = self
                .store
                .unwrap_or_else(|| Arc::new(PersistentStore::in_memory()));
            debug!("ephemeral database opened");
            return Ok(Database {
                data_dir: PathBuf::new(),
                store,
                directory: Directory::new(),
                wal: SharedWal::disabled(),
                thresholds: Arc::new(thresholds),
                retry,
                request_timeout,
                mode: DurabilityMode::None,
                ephemeral: true,
                recovery: RecoveryReport::default(),
                counters: Counters::default(),
            });
        };

        if self.store.is_some() {
            return Err(Error::InvalidConfig(
                "a custom progress store cannot be combined with a database path".into(),
            ));
        }

        let mode = self.durability.unwrap_or_else(|| self.config.durability_mode());
        std::fs::create_dir_all(&data_dir).map_err(|e| {
            Error::StorageUnavailable(format!("cannot create {}: {}", data_dir.display(), e))
        })?;

        let wal_path = data_dir.join(WAL_FILENAME);
        let records = ShardedStore::new();
        let directory = Directory::new();
        let stats = replay(&wal_path, &self.config.recovery_options(), |entry| match entry {
            WalEntry::RegisterUser { user } => directory.put_user(user),
            WalEntry::RegisterStore { store } => directory.put_store(store),
            WalEntry::PutRecord {
                user_id,
                store_id,
                record,
                version,
            } => {
                records.put_if_newer(&user_id, &store_id, Versioned::new(record, version));
            }
        })?;

        let levels_reconciled = reconcile_levels(&records, &thresholds) as u64;

        let wal = if mode.requires_wal() {
            SharedWal::new(Wal::open(&wal_path, mode)?)
        } else {
            SharedWal::disabled()
        };

        info!(
            path = %data_dir.display(),
            mode = mode.description(),
            records = records.total_entries(),
            users = directory.user_count(),
            stores = directory.store_count(),
            replayed = stats.entries_replayed,
            levels_reconciled,
            "database opened"
        );

        Ok(Database {
            data_dir,
            store: Arc::new(PersistentStore::new(records, wal.clone())),
            directory,
            wal,
            thresholds: Arc::new(thresholds),
            retry,
            request_timeout,
            mode,
            ephemeral: false,
            recovery: RecoveryReport {
                wal: stats,
                levels_reconciled,
            },
            counters: Counters::default(),
        })
    }
}

/// Bring every record's level in line with `thresholds`
fn reconcile_levels(records: &ShardedStore, thresholds: &ThresholdTable) -> usize {
    records.rewrite_all(|user_id, store_id, record| {
        let expected = thresholds.level_for(record.value.star_count);
        if expected == record.value.level {
            return false;
        }
        warn!(
            user = %user_id,
            store = %store_id,
            stars = record.value.star_count,
            stored = %record.value.level,
            expected = %expected,
            "reconciling level with threshold table"
        );
        record.value.level = expected;
        true
    })
}
