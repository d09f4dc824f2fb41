//! Retry policy with exponential backoff for external calls.

use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior
///
/// Generic over the error type: callers supply a predicate deciding which
/// errors are worth another attempt. Non-retryable errors return immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation, retrying failures the predicate accepts
    pub async fn run<T, E, F, Fut, P>(&self, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1u32;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "operation succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if attempt >= self.max_attempts.max(1) || !retryable(&error) {
                        return Err(error);
                    }
                    tracing::debug!(attempt, %error, delay_ms = delay.as_millis() as u64, "retrying after error");
                    sleep(delay).await;
                    delay = Duration::from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier);
                    attempt += 1;
                }
            }
        }
    }
}
