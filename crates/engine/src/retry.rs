//! Bounded retry of contended atomic applies

use serde::{Deserialize, Serialize};
use starling_core::{Error, OpContext, Result};
use std::time::Duration;
use tracing::warn;

/// How often to retry `ConcurrentModification`
///
/// Only contention is retried. Every other error, including context
/// cancellation, returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Linear backoff step between attempts, in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1,
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and no backoff
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_ms: 0,
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the returned
    /// `ConcurrentModification` reports the attempts made.
    pub fn run<T>(&self, ctx: &OpContext, mut op: impl FnMut(u32) -> Result<T>) -> Result<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            ctx.check()?;
            match op(attempt) {
                Err(Error::ConcurrentModification {
                    user_id, store_id, ..
                }) => {
                    if attempt >= max_attempts {
                        return Err(Error::ConcurrentModification {
                            user_id,
                            store_id,
                            attempts: attempt,
                        });
                    }
                    warn!(
                        user = %user_id,
                        store = %store_id,
                        attempt,
                        max_attempts,
                        "concurrent modification, retrying"
                    );
                    self.backoff(ctx, attempt);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn backoff(&self, ctx: &OpContext, attempt: u32) {
        if self.backoff_ms == 0 {
            return;
        }
        let mut pause = Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)));
        if let Some(remaining) = ctx.remaining() {
            pause = pause.min(remaining);
        }
        std::thread::sleep(pause);
    }
}
