//! Global request budget.
//!
//! The remote API enforces an account-wide limit of 60 requests per minute.
//! One [`RequestBudget`] is shared (behind `Arc`) by every provider instance
//! and worker, so the whole process stays inside the budget no matter how
//! many domains sync concurrently.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::error::ProviderError;

/// Default remote API budget: 60 requests per minute.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bound on how long a caller waits for a permit.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30);

/// Token-bucket request budget shared across all workers.
pub struct RequestBudget {
    limiter: DefaultDirectRateLimiter,
    max_wait: Duration,
}

impl RequestBudget {
    /// Create a budget allowing `per_minute` requests per minute.
    ///
    /// A zero rate is treated as 1 to keep the quota well-formed.
    #[must_use]
    pub fn new(per_minute: u32) -> Self {
        Self::with_max_wait(per_minute, DEFAULT_MAX_WAIT)
    }

    /// Create a budget with an explicit permit wait bound.
    #[must_use]
    pub fn with_max_wait(per_minute: u32, max_wait: Duration) -> Self {
        let rate = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(rate)),
            max_wait,
        }
    }

    /// Wait for a request permit, up to the configured bound.
    ///
    /// # Returns
    /// * `Ok(())` - a permit was acquired; the caller may issue one request
    /// * `Err(ProviderError::RateLimited)` - the bound elapsed without a permit
    pub async fn acquire(&self, provider_name: &str) -> Result<(), ProviderError> {
        match tokio::time::timeout(self.max_wait, self.limiter.until_ready()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                log::warn!(
                    "[{provider_name}] Request budget exhausted (waited {:.0}s)",
                    self.max_wait.as_secs_f32()
                );
                Err(ProviderError::RateLimited {
                    provider: provider_name.to_string(),
                    retry_after: None,
                    raw_message: Some("local request budget exhausted".to_string()),
                })
            }
        }
    }
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_within_budget_allowed() {
        let budget = RequestBudget::with_max_wait(60, Duration::from_millis(10));
        // A fresh bucket holds the full burst
        for _ in 0..5 {
            assert!(budget.acquire("test").await.is_ok());
        }
    }

    #[tokio::test]
    async fn exhausted_budget_rate_limits() {
        // 1 request/minute, near-zero wait: the second acquire must fail
        let budget = RequestBudget::with_max_wait(1, Duration::from_millis(10));
        assert!(budget.acquire("test").await.is_ok());
        let result = budget.acquire("test").await;
        assert!(
            matches!(&result, Err(ProviderError::RateLimited { .. })),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test]
    async fn zero_rate_treated_as_one() {
        let budget = RequestBudget::with_max_wait(0, Duration::from_millis(10));
        assert!(budget.acquire("test").await.is_ok());
    }
}
