//! WAL replay
//!
//! ## Recovery Sequence
//!
//! 1. Read the log file (a missing file is an empty log)
//! 2. Decode frames front to back, handing each entry to the caller
//! 3. A damaged but complete frame is skipped while the corrupt-entry budget
//!    lasts, and fails recovery once it is exhausted
//! 4. An incomplete final frame (torn write) ends replay; the file is
//!    truncated to the last complete frame so new appends start clean
//! 5. A frame is only torn if no intact frame follows it. A damaged length
//!    field that overruns later frames counts as corruption, never as a tail
//!
//! ## Key Principle
//!
//! After recovery the caller holds exactly the state of a prefix of the
//! appended entries; a torn write never surfaces as a partial record.

use crate::encoding::{decode_entry, EncodingError};
use crate::wal::WalEntry;
use starling_core::{Error, Result};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Recovery options
#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    /// Maximum damaged frames to skip before failing
    pub max_corrupt_entries: usize,
    /// Whether to cut a torn final frame off the file
    pub truncate_torn_tail: bool,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 0,
            truncate_torn_tail: true,
        }
    }
}

impl RecoveryOptions {
    /// Tolerate up to `max` damaged frames
    pub fn permissive(max: usize) -> Self {
        RecoveryOptions {
            max_corrupt_entries: max,
            ..Default::default()
        }
    }
}

/// Recovery result
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryStats {
    /// WAL entries handed to the caller
    pub entries_replayed: u64,
    /// Damaged frames skipped
    pub corrupt_entries_skipped: u64,
    /// Bytes of torn final frame discarded
    pub torn_tail_bytes: u64,
    /// Length of the valid prefix of the log
    pub valid_len: u64,
    /// Total recovery time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryStats {
    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} entries, {} corrupt, {} torn bytes, {:.2}ms",
            self.entries_replayed,
            self.corrupt_entries_skipped,
            self.torn_tail_bytes,
            self.recovery_time_micros as f64 / 1000.0
        )
    }

    /// Check if recovery had to discard anything
    pub fn has_issues(&self) -> bool {
        self.corrupt_entries_skipped > 0 || self.torn_tail_bytes > 0
    }
}

/// Replay the WAL at `path`, passing each intact entry to `apply`
///
/// # Errors
///
/// - `Corruption` when more than `max_corrupt_entries` frames are damaged
/// - `StorageUnavailable` when the file cannot be read or truncated
pub fn replay(
    path: impl AsRef<Path>,
    options: &RecoveryOptions,
    mut apply: impl FnMut(WalEntry),
) -> Result<RecoveryStats> {
    let path = path.as_ref();
    let started = Instant::now();
    let mut stats = RecoveryStats::default();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No WAL file found at {}", path.display());
            return Ok(stats);
        }
        Err(e) => {
            return Err(Error::StorageUnavailable(format!(
                "cannot read WAL {}: {}",
                path.display(),
                e
            )))
        }
    };

    let mut offset = 0usize;
    while offset < bytes.len() {
        match decode_entry(&bytes[offset..]) {
            Ok((entry, used)) => {
                apply(entry);
                stats.entries_replayed += 1;
                offset += used;
            }
            Err(EncodingError::Incomplete { have, needed }) => {
                match next_frame(&bytes, offset + 1) {
                    // A complete frame further on: the header lied
                    Some(next) => {
                        skip_damaged(&mut stats, options, path, offset)?;
                        offset = next;
                    }
                    None => {
                        warn!(
                            "Torn WAL frame at offset {}: need {} bytes, have {}",
                            offset, needed, have
                        );
                        stats.torn_tail_bytes = (bytes.len() - offset) as u64;
                        break;
                    }
                }
            }
            Err(EncodingError::Oversized { len }) => {
                warn!("Implausible WAL frame length {} at offset {}", len, offset);
                skip_damaged(&mut stats, options, path, offset)?;
                match next_frame(&bytes, offset + 1) {
                    Some(next) => offset = next,
                    // Damaged last frame; left in place, never truncated
                    None => break,
                }
            }
            Err(EncodingError::ChecksumMismatch { frame_len, .. })
            | Err(EncodingError::Payload { frame_len, .. }) => {
                skip_damaged(&mut stats, options, path, offset)?;
                // The length may be the damaged field; resync on the next intact frame
                offset = next_frame(&bytes, offset + 1).unwrap_or(offset + frame_len);
            }
            Err(e @ EncodingError::Serialize(_)) => {
                return Err(Error::Corruption(e.to_string()));
            }
        }
    }
    stats.valid_len = offset as u64;

    if stats.torn_tail_bytes > 0 && options.truncate_torn_tail {
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(stats.valid_len)?;
        file.sync_all()?;
        info!(
            "Truncated {} torn bytes from {}",
            stats.torn_tail_bytes,
            path.display()
        );
    }

    stats.recovery_time_micros = started.elapsed().as_micros() as u64;
    info!("{}", stats.summary());
    Ok(stats)
}

/// Count one damaged frame, failing once the budget is spent
fn skip_damaged(
    stats: &mut RecoveryStats,
    options: &RecoveryOptions,
    path: &Path,
    offset: usize,
) -> Result<()> {
    stats.corrupt_entries_skipped += 1;
    if stats.corrupt_entries_skipped as usize > options.max_corrupt_entries {
        return Err(Error::Corruption(format!(
            "damaged WAL frame at offset {} in {} ({} damaged, {} allowed)",
            offset,
            path.display(),
            stats.corrupt_entries_skipped,
            options.max_corrupt_entries
        )));
    }
    warn!("Skipping damaged WAL frame at offset {}", offset);
    Ok(())
}

/// Offset of the first intact frame at or after `from`
fn next_frame(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len()).find(|&offset| decode_entry(&bytes[offset..]).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_entry;
    use crate::wal::{Wal, WAL_FILENAME};
    use crate::DurabilityMode;
    use starling_core::{StoreId, StoreInfo};
    use std::io::Write;

    fn store_entry(n: usize) -> WalEntry {
        WalEntry::RegisterStore {
            store: StoreInfo::new(StoreId::from(format!("s{}", n)), format!("Store {}", n), "here"),
        }
    }

    fn write_log(path: &Path, count: usize) {
        let mut wal = Wal::open(path, DurabilityMode::Strict).unwrap();
        for n in 0..count {
            wal.append(&store_entry(n)).unwrap();
        }
    }

    fn collect(path: &Path, options: &RecoveryOptions) -> Result<(Vec<WalEntry>, RecoveryStats)> {
        let mut entries = Vec::new();
        let stats = replay(path, options, |e| entries.push(e))?;
        Ok((entries, stats))
    }

    #[test]
    fn test_missing_file_is_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let (entries, stats) = collect(&dir.path().join(WAL_FILENAME), &RecoveryOptions::default()).unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats.entries_replayed, 0);
        assert!(!stats.has_issues());
    }

    #[test]
    fn test_replays_all_entries_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 5);

        let (entries, stats) = collect(&path, &RecoveryOptions::default()).unwrap();
        assert_eq!(entries, (0..5).map(store_entry).collect::<Vec<_>>());
        assert_eq!(stats.entries_replayed, 5);
        assert_eq!(stats.valid_len, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 3);
        let intact_len = std::fs::metadata(&path).unwrap().len();

        let partial = encode_entry(&store_entry(3)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&partial[..partial.len() / 2]).unwrap();
        drop(file);

        let (entries, stats) = collect(&path, &RecoveryOptions::default()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(stats.torn_tail_bytes, (partial.len() / 2) as u64);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), intact_len);

        // A second pass sees a clean log
        let (_, stats) = collect(&path, &RecoveryOptions::default()).unwrap();
        assert!(!stats.has_issues());
    }

    #[test]
    fn test_corrupt_frame_fails_strict_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 3);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[10] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let result = collect(&path, &RecoveryOptions::default());
        assert!(matches!(result, Err(Error::Corruption(_))));
    }

    #[test]
    fn test_damaged_length_is_corruption_not_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 4);
        let len = std::fs::metadata(&path).unwrap().len();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[3] ^= 0x7F;
        std::fs::write(&path, &bytes).unwrap();

        let result = collect(&path, &RecoveryOptions::default());
        assert!(matches!(result, Err(Error::Corruption(_))));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len);

        let (entries, stats) = collect(&path, &RecoveryOptions::permissive(1)).unwrap();
        assert_eq!(entries, (1..4).map(store_entry).collect::<Vec<_>>());
        assert_eq!(stats.corrupt_entries_skipped, 1);
        assert_eq!(stats.torn_tail_bytes, 0);
    }

    #[test]
    fn test_overlong_length_before_intact_frames_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 3);

        // Plausible but wrong: the first frame claims to run past EOF
        let mut bytes = std::fs::read(&path).unwrap();
        let total = bytes.len() as u32;
        bytes[0..4].copy_from_slice(&total.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let result = collect(&path, &RecoveryOptions::default());
        assert!(matches!(result, Err(Error::Corruption(_))));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_corrupt_frame_skipped_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(WAL_FILENAME);
        write_log(&path, 3);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[10] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let (entries, stats) = collect(&path, &RecoveryOptions::permissive(1)).unwrap();
        assert_eq!(entries, vec![store_entry(1), store_entry(2)]);
        assert_eq!(stats.corrupt_entries_skipped, 1);
        assert!(stats.has_issues());
    }
}
