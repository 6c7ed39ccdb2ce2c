//! Handles exposed as fields of [`Starling`](crate::Starling).
//!
//! - `db.stickers`: purchases and progression queries
//! - `db.registry`: users and stores

mod registry;
mod stickers;

pub use registry::Registry;
pub use stickers::Stickers;
