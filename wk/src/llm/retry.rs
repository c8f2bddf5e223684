//! Retry policy for model invocations
//!
//! Only transient overload (503 / "overloaded") is retried; every other error
//! propagates on the first attempt. Backoff doubles from the initial delay:
//! with defaults that is 2s, 4s, 8s. Each call sleeps on its own future, so a
//! backing-off request never delays an unrelated one.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for overload errors
pub const MAX_RETRIES: u32 = 3;

/// Initial backoff delay
pub const INITIAL_BACKOFF_MS: u64 = 2000;

/// Bounded exponential backoff on overload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// Delay before retry number `retry` (1-based)
    ///
    /// Saturates at `Duration::MAX` instead of overflowing on large retry counts.
    pub fn backoff(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry.saturating_sub(1))
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Run `op`, retrying it while it fails with an overload error
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => {
                    debug!(retry, "run: success");
                    return Ok(value);
                }
                Err(e) if e.is_overloaded() && retry < self.max_retries => {
                    retry += 1;
                    let backoff = self.backoff(retry);
                    warn!(
                        retry,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "run: model overloaded, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    debug!(retry, error = %e, "run: giving up");
                    return Err(e);
                }
            }
        }
    }
}
