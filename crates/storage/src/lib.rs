//! Storage layer for Starling
//!
//! This crate holds the in-memory state the engine persists through the WAL:
//! - ShardedStore: per-user shards of progression records with per-key
//!   exclusive updates
//! - Directory: registered users and stores

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod sharded;

pub use directory::Directory;
pub use sharded::{Shard, ShardedStore, StoredRecord};
