//! Engine layer for Starling
//!
//! This crate wires storage and durability into the purchase path:
//! - Progression engine: the pure one-star-per-purchase state machine
//! - PersistentStore: the sharded map plus WAL behind `ProgressStore`
//! - RetryPolicy: bounded retry of `ConcurrentModification`
//! - StarlingConfig: TOML configuration
//! - Database / DatabaseBuilder: open, recover, record purchases, query

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod metrics;
pub mod progression;
pub mod retry;
pub mod store;

pub use config::{DurabilityKind, RequestConfig, StarlingConfig, StorageConfig};
pub use database::{Database, DatabaseBuilder, PurchaseReceipt, RecoveryReport, StickerView};
pub use metrics::EngineMetrics;
pub use progression::{apply_purchase, PurchaseOutcome};
pub use retry::RetryPolicy;
pub use store::{PersistentStore, SharedWal};

pub use starling_durability::{DurabilityMode, RecoveryStats};
