//! Exponential backoff for transient endpoint failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error_handler::Result;

/// Backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (`0` disables retrying).
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(base.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Runs `operation` until it succeeds, fails permanently, or retries run out.
///
/// Only errors for which [`crate::EndpointError::is_retryable`] holds are retried;
/// the last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt < config.max_retries && e.is_retryable() => {
                let delay = config.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying endpoint call after transient error"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
