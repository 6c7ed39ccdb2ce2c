//! Error taxonomy for Starling
//!
//! | Variant | Raised by | Retryable |
//! |---------|-----------|-----------|
//! | NotFound | queries, apply on a missing key | no |
//! | ConcurrentModification | atomic apply under contention | yes, bounded |
//! | StorageUnavailable | WAL / file I/O | no |
//! | InvalidThresholdConfig | threshold validation at open | no (refuse to start) |
//! | Cancelled / DeadlineExceeded | request context | no |
//!
//! The progression engine itself never fails.

use crate::types::{StoreId, UserId};
use thiserror::Error;

/// All errors raised by the core, storage, durability and engine crates
#[derive(Debug, Error)]
pub enum Error {
    /// No record exists for the pair
    #[error("no progress for user {user_id} at store {store_id}")]
    NotFound {
        /// User half of the key
        user_id: UserId,
        /// Store half of the key
        store_id: StoreId,
    },

    /// The user is not in the directory
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    /// The store is not in the directory
    #[error("unknown store: {0}")]
    UnknownStore(StoreId),

    /// An atomic apply could not commit
    #[error("concurrent modification of user {user_id} at store {store_id} after {attempts} attempt(s)")]
    ConcurrentModification {
        /// User half of the key
        user_id: UserId,
        /// Store half of the key
        store_id: StoreId,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Durable storage could not be read or written
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The WAL contains damaged frames
    #[error("corruption: {0}")]
    Corruption(String),

    /// The threshold table is not a valid progression
    #[error("invalid threshold config: {0}")]
    InvalidThresholdConfig(String),

    /// Any other configuration problem
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// The operation's deadline passed before it committed
    #[error("deadline exceeded after {timeout_ms}ms")]
    DeadlineExceeded {
        /// Budget the caller allowed
        timeout_ms: u64,
    },

    /// Malformed caller input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result alias for Starling operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether retrying the same operation may succeed
    ///
    /// Only contention is retryable; I/O failures are surfaced as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. })
    }

    /// Whether this is a missing-record error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::UnknownUser(_) | Error::UnknownStore(_)
        )
    }

    /// Whether the request context stopped the operation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}
