//! Main database entry point for Starling.
//!
//! This module provides the `Starling` struct, the primary entry point for
//! recording purchases and reading stickers.

use crate::error::{Error, Result};
use crate::handles::{Registry, Stickers};
use starling_engine::{DurabilityMode, EngineMetrics, RetryPolicy, StarlingConfig};
use starling_core::ThresholdTable;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The Starling database.
///
/// Create one with [`Starling::open`], [`Starling::ephemeral`] or
/// [`Starling::builder`].
///
/// # Example
///
/// ```ignore
/// use starling::prelude::*;
///
/// let db = Starling::open("./stickers")?;
///
/// let receipt = db.stickers.record_purchase("alice", "corner-cafe")?;
/// if receipt.leveled_up {
///     println!("now {}", receipt.level);
/// }
///
/// db.close()?;
/// ```
pub struct Starling {
    /// The underlying engine database
    pub(crate) inner: Arc<starling_engine::Database>,

    /// Purchases and progression queries
    pub stickers: Stickers,

    /// User and store directory
    pub registry: Registry,
}

impl Starling {
    /// Open a database at the given path.
    ///
    /// Uses default settings (batched durability, standard thresholds).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral database with no disk I/O.
    ///
    /// All data is lost when the handle is dropped.
    pub fn ephemeral() -> Result<Self> {
        let db = Arc::new(starling_engine::Database::ephemeral().map_err(Error::from)?);
        Ok(Self::from_engine(db))
    }

    /// Create a builder for database configuration.
    pub fn builder() -> StarlingBuilder {
        StarlingBuilder::new()
    }

    /// Force buffered writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush().map_err(Into::into)
    }

    /// Flush and log shutdown.
    pub fn close(&self) -> Result<()> {
        self.inner.shutdown().map_err(Into::into)
    }

    /// Get the database directory path.
    pub fn path(&self) -> &Path {
        self.inner.data_dir()
    }

    /// Get the current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.inner.durability_mode()
    }

    /// Check if this is an ephemeral (no-disk) database.
    pub fn is_ephemeral(&self) -> bool {
        self.inner.is_ephemeral()
    }

    /// The active threshold table.
    pub fn thresholds(&self) -> &ThresholdTable {
        self.inner.thresholds()
    }

    /// Get database metrics.
    pub fn metrics(&self) -> EngineMetrics {
        self.inner.metrics()
    }

    /// What the last open recovered from the WAL.
    pub fn recovery_report(&self) -> &starling_engine::RecoveryReport {
        self.inner.recovery_report()
    }

    fn from_engine(db: Arc<starling_engine::Database>) -> Self {
        Self {
            stickers: Stickers::new(db.clone()),
            registry: Registry::new(db.clone()),
            inner: db,
        }
    }
}

impl std::fmt::Debug for Starling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Starling").field("inner", &self.inner).finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Production: disk-backed, batched fsync
/// let db = Starling::builder()
///     .path("./stickers")
///     .config(StarlingConfig::load("starling.toml")?)
///     .open()?;
///
/// // Every purchase fsynced before it returns
/// let db = Starling::builder().path("./stickers").strict().open()?;
/// ```
pub struct StarlingBuilder {
    inner: starling_engine::DatabaseBuilder,
}

impl StarlingBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            inner: starling_engine::DatabaseBuilder::new(),
        }
    }

    /// Set the database directory path.
    ///
    /// Without a path the database is ephemeral.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.inner = self.inner.path(path.as_ref());
        self
    }

    /// Take settings from a parsed configuration file.
    pub fn config(mut self, config: StarlingConfig) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    /// Keep a WAL-less database, even with a path.
    pub fn no_durability(mut self) -> Self {
        self.inner = self.inner.no_durability();
        self
    }

    /// Use batched mode (default): fsync every 100ms or 1000 writes.
    pub fn buffered(mut self) -> Self {
        self.inner = self.inner.buffered();
        self
    }

    /// Use strict mode: fsync on every purchase.
    pub fn strict(mut self) -> Self {
        self.inner = self.inner.strict();
        self
    }

    /// Use a custom threshold table.
    pub fn thresholds(mut self, table: ThresholdTable) -> Self {
        self.inner = self.inner.thresholds(table);
        self
    }

    /// Use a custom retry policy for contended purchases.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.inner = self.inner.retry(policy);
        self
    }

    /// Deadline for purchases made without an explicit context.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inner = self.inner.request_timeout(timeout);
        self
    }

    /// Open the database.
    pub fn open(self) -> Result<Starling> {
        let db = Arc::new(self.inner.open().map_err(Error::from)?);
        Ok(Starling::from_engine(db))
    }
}

impl Default for StarlingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
