//! WAL (Write-Ahead Log) entries and the append-only log file
//!
//! Every state change is appended here before it becomes visible in memory:
//! - RegisterUser / RegisterStore: directory inserts
//! - PutRecord: the full post-change progression record with its version
//!
//! PutRecord carries whole records rather than deltas, so replay is
//! idempotent and order-insensitive per key: the highest version wins.

use crate::encoding::encode_entry;
use crate::mode::DurabilityMode;
use serde::{Deserialize, Serialize};
use starling_core::{Error, Result, SatisfactionRecord, StoreId, StoreInfo, UserId, UserInfo};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::error;

/// File name of the WAL inside a database directory
pub const WAL_FILENAME: &str = "starling.wal";

/// WAL entry types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WalEntry {
    /// A user was registered
    RegisterUser {
        /// The registered user
        user: UserInfo,
    },

    /// A store was registered or replaced
    RegisterStore {
        /// The registered store
        store: StoreInfo,
    },

    /// A progression record was created or changed
    PutRecord {
        /// User half of the key
        user_id: UserId,
        /// Store half of the key
        store_id: StoreId,
        /// Record after the change
        record: SatisfactionRecord,
        /// Per-key version of `record`
        version: u64,
    },
}

impl WalEntry {
    /// Get the user this entry concerns (if applicable)
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            WalEntry::RegisterUser { user } => Some(&user.user_id),
            WalEntry::PutRecord { user_id, .. } => Some(user_id),
            WalEntry::RegisterStore { .. } => None,
        }
    }

    /// Get the record version (PutRecord only)
    pub fn version(&self) -> Option<u64> {
        match self {
            WalEntry::PutRecord { version, .. } => Some(*version),
            _ => None,
        }
    }
}

/// Append-only WAL file
///
/// Not internally synchronized; the engine serializes appends behind a mutex.
pub struct Wal {
    path: PathBuf,
    file: File,
    mode: DurabilityMode,
    unsynced: usize,
    last_sync: Instant,
    appended: u64,
    /// Bytes of whole, acknowledged frames
    len: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl Wal {
    /// Open (or create) the WAL at `path` for appending
    ///
    /// Call [`replay`](crate::replay) first when reopening an existing log.
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                Error::StorageUnavailable(format!("cannot open WAL {}: {}", path.display(), e))
            })?;
        let len = file
            .metadata()
            .map_err(|e| {
                Error::StorageUnavailable(format!("cannot stat WAL {}: {}", path.display(), e))
            })?
            .len();

        Ok(Self {
            path,
            file,
            mode,
            unsynced: 0,
            last_sync: Instant::now(),
            appended: 0,
            len,
            poisoned: false,
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durability mode the log was opened with
    pub fn mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Entries appended since open
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Whether a failed append left the file in an unknown state
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Append one entry, syncing as the durability mode requires
    ///
    /// On error the entry is not in the log: a partly written or unsynced
    /// frame is cut off again. If that cut fails the log refuses all further
    /// appends.
    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        if self.poisoned {
            return Err(Error::StorageUnavailable(format!(
                "WAL {} is unusable after an earlier write failure",
                self.path.display()
            )));
        }
        let frame = encode_entry(entry).map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        if let Err(e) = self.file.write_all(&frame) {
            error!(path = %self.path.display(), error = %e, "WAL append failed");
            return Err(self.rollback(Error::StorageUnavailable(format!(
                "WAL append failed: {}",
                e
            ))));
        }
        self.unsynced += 1;

        let due = self.mode.requires_immediate_fsync()
            || match self.mode {
                DurabilityMode::Batched {
                    interval_ms,
                    batch_size,
                } => {
                    self.unsynced >= batch_size
                        || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
                }
                _ => false,
            };
        if due {
            if let Err(e) = self.sync() {
                self.unsynced -= 1;
                return Err(self.rollback(e));
            }
        }
        self.len += frame.len() as u64;
        self.appended += 1;
        Ok(())
    }

    /// Cut the file back to the last acknowledged frame
    fn rollback(&mut self, cause: Error) -> Error {
        if let Err(e) = self.file.set_len(self.len) {
            error!(path = %self.path.display(), error = %e, "WAL rollback failed");
            self.poisoned = true;
        }
        cause
    }

    /// Force pending appends to disk
    pub fn flush(&mut self) -> Result<()> {
        if self.unsynced > 0 {
            self.sync()?;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_data().map_err(|e| {
            error!(path = %self.path.display(), error = %e, "WAL fsync failed");
            Error::StorageUnavailable(format!("WAL fsync failed: {}", e))
        })?;
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("appended", &self.appended)
            .field("unsynced", &self.unsynced)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
