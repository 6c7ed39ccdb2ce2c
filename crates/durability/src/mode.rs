//! Durability mode for WAL operations.
//!
//! Defines the durability guarantees for WAL writes.

/// Durability mode for WAL writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// performance and durability.
///
/// | Mode | WAL | fsync | Data Loss Window |
/// |------|-----|-------|------------------|
/// | None | none | never | everything |
/// | Batched | append | every N appends or T ms | bounded |
/// | Strict | append | every append | zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// No durability - all data lost when the process exits.
    ///
    /// Bypasses WAL entirely. No file I/O.
    None,

    /// fsync after every append.
    ///
    /// Use when losing a single purchase is unacceptable.
    Strict,

    /// fsync every N appends OR every T milliseconds.
    ///
    /// May lose up to batch_size appends or interval_ms of data if the
    /// machine crashes; a process crash alone loses nothing already appended.
    Batched {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum appends between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires WAL persistence.
    ///
    /// Returns false for None mode, true for all others.
    pub fn requires_wal(&self) -> bool {
        !matches!(self, DurabilityMode::None)
    }

    /// Check if this mode requires immediate fsync on every append.
    ///
    /// Returns true only for Strict mode.
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Strict)
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No durability (fastest, all data lost on exit)",
            DurabilityMode::Strict => "Sync fsync (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }

    /// Create a batched mode with recommended defaults.
    ///
    /// Returns `Batched { interval_ms: 100, batch_size: 1000 }`.
    pub fn buffered_default() -> Self {
        DurabilityMode::Batched {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::buffered_default()
    }
}
