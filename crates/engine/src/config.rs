//! TOML configuration
//!
//! Every section is optional; a missing file section or key takes the default.
//!
//! ```toml
//! [storage]
//! durability = "batched"      # "none" | "strict" | "batched"
//! batch_interval_ms = 100
//! batch_size = 1000
//! max_corrupt_entries = 0
//!
//! [retry]
//! max_attempts = 3
//! backoff_ms = 1
//!
//! [requests]
//! timeout_ms = 5000           # 0 disables the default deadline
//!
//! [[levels]]
//! level = "bronze"
//! stars_required = 5
//! next_level = "silver"
//! ```

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use starling_core::{Error, LevelThreshold, Result, ThresholdTable};
use starling_durability::{DurabilityMode, RecoveryOptions};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Which durability mode to open the WAL with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityKind {
    /// No WAL file
    None,
    /// fsync every append
    Strict,
    /// fsync on interval or batch size
    Batched,
}

fn default_batch_interval_ms() -> u64 {
    100
}

fn default_batch_size() -> usize {
    1000
}

/// `[storage]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Durability mode
    #[serde(default = "default_durability")]
    pub durability: DurabilityKind,
    /// Batched mode: longest time between fsyncs
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
    /// Batched mode: most appends between fsyncs
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Damaged WAL frames tolerated during replay
    #[serde(default)]
    pub max_corrupt_entries: usize,
}

fn default_durability() -> DurabilityKind {
    DurabilityKind::Batched
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            durability: default_durability(),
            batch_interval_ms: default_batch_interval_ms(),
            batch_size: default_batch_size(),
            max_corrupt_entries: 0,
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

/// `[requests]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    /// Deadline applied to purchases that do not bring their own context
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Complete database configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarlingConfig {
    /// WAL settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Contention retry settings
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Per-request defaults
    #[serde(default)]
    pub requests: RequestConfig,
    /// Custom threshold table; the standard table when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<LevelThreshold>>,
}

impl StarlingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StarlingConfig =
            toml::from_str(text).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Check every section
    ///
    /// # Errors
    ///
    /// - `InvalidThresholdConfig` for a bad `[[levels]]` table
    /// - `InvalidConfig` for anything else
    pub fn validate(&self) -> Result<()> {
        if self.storage.durability == DurabilityKind::Batched {
            if self.storage.batch_size == 0 {
                return Err(Error::InvalidConfig(
                    "storage.batch_size must be at least 1".into(),
                ));
            }
            if self.storage.batch_interval_ms == 0 {
                return Err(Error::InvalidConfig(
                    "storage.batch_interval_ms must be at least 1".into(),
                ));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        self.threshold_table().map(|_| ())
    }

    /// The validated threshold table
    pub fn threshold_table(&self) -> Result<ThresholdTable> {
        match &self.levels {
            Some(levels) => ThresholdTable::new(levels.clone()),
            None => Ok(ThresholdTable::standard()),
        }
    }

    /// The WAL durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        match self.storage.durability {
            DurabilityKind::None => DurabilityMode::None,
            DurabilityKind::Strict => DurabilityMode::Strict,
            DurabilityKind::Batched => DurabilityMode::Batched {
                interval_ms: self.storage.batch_interval_ms,
                batch_size: self.storage.batch_size,
            },
        }
    }

    /// Replay options
    pub fn recovery_options(&self) -> RecoveryOptions {
        RecoveryOptions::permissive(self.storage.max_corrupt_entries)
    }

    /// Default request deadline; `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.requests.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
