//! Public types for the Starling API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Identifiers and directory entries
pub use starling_core::{StoreId, StoreInfo, UserId, UserInfo};

// Progression state
pub use starling_core::{Level, SatisfactionRecord, Timestamp, Versioned};

// Threshold table
pub use starling_core::{LevelThreshold, ThresholdTable};

// Request scoping
pub use starling_core::{CancellationToken, OpContext};

// Engine results and settings
pub use starling_engine::{
    DurabilityMode, EngineMetrics, PurchaseReceipt, RecoveryReport, RetryPolicy, StarlingConfig,
    StickerView,
};
