//! Retry logic for transient server errors
//!
//! Provides exponential backoff retry for 5xx and 429 errors. Used by the
//! RPC transport and by the individual resumable-upload steps.
//!
//! This policy runs *before* auth recovery: a 401/403 is never retried here,
//! it is routed to the recovery ladder instead.

use std::future::Future;
use std::time::Duration;

use crate::error::{is_retryable_error, Result};

/// Default maximum retry attempts (in addition to the initial call).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default initial backoff delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default backoff ceiling.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(16);

/// Bounded exponential-backoff retry policy for transient server errors.
///
/// `delay = min(base_delay * 2^attempt, max_delay)`
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial call.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit bounds.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Backoff delay for a given zero-based attempt number.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .checked_mul(1u32 << attempt.min(31))
            .unwrap_or(self.max_delay);
        exp.min(self.max_delay)
    }

    /// Execute an async operation with retry on transient server errors.
    ///
    /// Non-retryable errors (400/404, auth failures, connection errors)
    /// propagate immediately without delay. Given N retryable failures
    /// followed by a success, the operation is invoked exactly N+1 times
    /// for N <= max_retries; otherwise it fails after max_retries+1
    /// invocations.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retryable_error(&err) || attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "Server error on attempt {}/{}, retrying in {:.1}s: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        delay.as_secs_f64(),
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
