//! Per-request cancellation and deadlines
//!
//! Every store call takes an [`OpContext`]. Stores check it before doing any
//! work and again right before their commit point, so a fired context never
//! leaves a partially applied record behind.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag
///
/// Clones observe the same flag; cancelling any clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every operation holding this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Cancellation and deadline for one operation
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    started: Option<Instant>,
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
}

impl OpContext {
    /// A context that never fires
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            started: Some(Instant::now()),
            timeout: Some(timeout),
            token: None,
        }
    }

    /// Attach a cancellation token
    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Time left before the deadline, if one is set
    pub fn remaining(&self) -> Option<Duration> {
        match (self.started, self.timeout) {
            (Some(started), Some(timeout)) => Some(timeout.saturating_sub(started.elapsed())),
            _ => None,
        }
    }

    /// Fail if the operation has been cancelled or its deadline has passed
    pub fn check(&self) -> Result<()> {
        if self.token.as_ref().map_or(false, |t| t.is_cancelled()) {
            return Err(Error::Cancelled);
        }
        if let (Some(started), Some(timeout)) = (self.started, self.timeout) {
            if started.elapsed() >= timeout {
                return Err(Error::DeadlineExceeded {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}
