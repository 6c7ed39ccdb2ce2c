//! Public error type for Starling.
//!
//! The engine's error taxonomy is flattened here into the handful of cases a
//! caller acts on: missing data, contention, storage trouble, bad
//! configuration, cancellation and bad input.

use thiserror::Error;

/// All Starling errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No record, user or store with that identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// Contention outlasted the retry policy
    #[error("conflict: {0}")]
    Conflict(String),

    /// The WAL or data directory could not be used
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration or threshold table rejected at open
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The request was cancelled or ran out of time
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Malformed caller input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Starling operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Only conflicts may succeed when the same call is repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this error should stop the process from serving.
    pub fn is_serious(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::InvalidConfig(_) | Error::Internal(_)
        )
    }
}

impl From<starling_core::Error> for Error {
    fn from(e: starling_core::Error) -> Self {
        use starling_core::Error as CoreError;
        match e {
            CoreError::NotFound { user_id, store_id } => {
                Error::NotFound(format!("progress of user {} at store {}", user_id, store_id))
            }
            CoreError::UnknownUser(user_id) => Error::NotFound(format!("user {}", user_id)),
            CoreError::UnknownStore(store_id) => Error::NotFound(format!("store {}", store_id)),
            e @ CoreError::ConcurrentModification { .. } => Error::Conflict(e.to_string()),
            CoreError::StorageUnavailable(msg) => Error::Storage(msg),
            CoreError::Corruption(msg) => Error::Storage(format!("corruption: {}", msg)),
            CoreError::InvalidThresholdConfig(msg) => {
                Error::InvalidConfig(format!("thresholds: {}", msg))
            }
            CoreError::InvalidConfig(msg) => Error::InvalidConfig(msg),
            CoreError::Cancelled => Error::Cancelled("operation cancelled".into()),
            CoreError::DeadlineExceeded { timeout_ms } => {
                Error::Cancelled(format!("deadline of {}ms exceeded", timeout_ms))
            }
            CoreError::InvalidInput(msg) => Error::InvalidInput(msg),
        }
    }
}
