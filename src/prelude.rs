//! Convenient imports for Starling.
//!
//! ```ignore
//! use starling::prelude::*;
//!
//! let db = Starling::open("./stickers")?;
//! db.stickers.record_purchase("alice", "corner-cafe")?;
//! ```

// Main entry point
pub use crate::database::{Starling, StarlingBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Handles
pub use crate::handles::{Registry, Stickers};

// Core types
pub use crate::types::{
    CancellationToken, Level, OpContext, PurchaseReceipt, SatisfactionRecord, StickerView, StoreId,
    UserId,
};

// Configuration
pub use crate::types::{LevelThreshold, StarlingConfig, ThresholdTable};
