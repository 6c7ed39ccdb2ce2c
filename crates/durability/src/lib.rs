//! Durability layer for Starling
//!
//! This crate implements the write-ahead log the engine appends to before a
//! change becomes visible:
//! - WalEntry types: RegisterUser, RegisterStore, PutRecord
//! - Entry framing with CRC32 checksums
//! - Durability modes: None, Strict, Batched (default)
//! - Recovery: replay the WAL, truncating a torn final frame

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod mode;
pub mod recovery;
pub mod wal;

pub use encoding::{decode_entry, encode_entry, EncodingError};
pub use mode::DurabilityMode;
pub use recovery::{replay, RecoveryOptions, RecoveryStats};
pub use wal::{Wal, WalEntry, WAL_FILENAME};
