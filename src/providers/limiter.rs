//! Per-provider rate budgets backed by token buckets.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::time::Duration;

use super::FetchError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket guarding one provider.
///
/// Callers wait for a permit up to `max_wait`; when the budget cannot be
/// satisfied in time the call fails fast with [`FetchError::RateLimited`]
/// instead of queueing unboundedly.
#[derive(Debug)]
pub struct RateBudget {
    limiter: DirectLimiter,
    max_wait: Duration,
}

impl RateBudget {
    /// Budget allowing `per_second` requests per second, with burst equal to
    /// the sustained rate.
    pub fn per_second(per_second: u32, max_wait: Duration) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(nonzero!(1u32));
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            max_wait,
        }
    }

    /// Acquire one permit, waiting up to the configured budget
    pub async fn acquire(&self) -> Result<(), FetchError> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }
        tokio::time::timeout(self.max_wait, self.limiter.until_ready())
            .await
            .map_err(|_| FetchError::RateLimited)
    }

    /// Acquire one permit without waiting
    pub fn try_acquire(&self) -> Result<(), FetchError> {
        self.limiter.check().map_err(|_| FetchError::RateLimited)
    }
}
