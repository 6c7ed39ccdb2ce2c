//! # Starling
//!
//! Loyalty-sticker progression store.
//!
//! Every purchase adds one star to a user's sticker at a store. Once the
//! stars reach the threshold of the sticker's level, the sticker moves up a
//! level (bronze, silver, gold, platinum). Purchases on the same sticker are
//! applied atomically, so N concurrent purchases always add N stars.
//!
//! ## Quick Start
//!
//! ```ignore
//! use starling::prelude::*;
//!
//! let db = Starling::open("./stickers")?;
//!
//! db.registry.put_store("corner-cafe", "Corner Cafe", "Main St")?;
//! let receipt = db.stickers.record_purchase("alice", "corner-cafe")?;
//! println!("{} stars, {}", receipt.star_count, receipt.level);
//!
//! for sticker in db.stickers.stickers("alice")? {
//!     println!("{:?}: {}", sticker.store_name, sticker.level);
//! }
//!
//! db.close()?;
//! ```
//!
//! ## Handles
//!
//! - [`Stickers`] - purchases and progression queries
//! - [`Registry`] - users and stores

#![warn(missing_docs)]

mod database;
mod error;
mod handles;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Starling, StarlingBuilder};
pub use error::{Error, Result};

// Re-export handles
pub use handles::{Registry, Stickers};

// Re-export types
pub use types::*;
