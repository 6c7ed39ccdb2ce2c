//! Core types for Starling
//!
//! This crate defines the vocabulary shared by every other crate:
//! - Identifiers: [`UserId`], [`StoreId`]
//! - Progression state: [`SatisfactionRecord`], [`Level`], [`Versioned`]
//! - Configuration data: [`LevelThreshold`], [`ThresholdTable`]
//! - Request scoping: [`OpContext`], [`CancellationToken`]
//! - The storage contract: [`ProgressStore`]
//! - The error taxonomy: [`Error`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod level;
pub mod record;
pub mod threshold;
pub mod traits;
pub mod types;

pub use context::{CancellationToken, OpContext};
pub use error::{Error, Result};
pub use level::Level;
pub use record::{SatisfactionRecord, Timestamp, Versioned};
pub use threshold::{LevelThreshold, ThresholdTable};
pub use traits::ProgressStore;
pub use types::{StoreId, StoreInfo, UserId, UserInfo};
