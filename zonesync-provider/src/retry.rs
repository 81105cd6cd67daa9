//! Retry policy for transient remote failures.
//!
//! Operations are retried only when [`ProviderError::is_retryable`] holds.
//! Delays use exponential backoff with full jitter; a `retry-after` hint from
//! the API takes precedence over the computed backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ProviderError;

/// Retry schedule parameters.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (so 5 means up to 4 retries).
    pub max_attempts: u32,
    /// Backoff base for the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff ceiling for the given retry (0-based): `base * 2^attempt`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(20); // prevent shift overflow
        let ceiling_ms = self
            .base_delay
            .as_millis()
            .saturating_mul(1 << capped_attempt);
        let max_ms = self.max_delay.as_millis();
        Duration::from_millis(u64::try_from(ceiling_ms.min(max_ms)).unwrap_or(u64::MAX))
    }

    /// Delay before the next attempt: the API's `retry-after` hint when
    /// present, otherwise full jitter in `[0, ceiling]`.
    #[must_use]
    pub fn delay_for(&self, error: &ProviderError, attempt: u32) -> Duration {
        if let ProviderError::RateLimited {
            retry_after: Some(secs),
            ..
        } = error
        {
            return Duration::from_secs(*secs).min(self.max_delay);
        }
        let ceiling = self.backoff_ceiling(attempt).as_millis();
        let jittered = rand::rng().random_range(0..=ceiling);
        Duration::from_millis(u64::try_from(jittered).unwrap_or(u64::MAX))
    }

    /// Run an operation, retrying transient failures per this policy.
    ///
    /// `op` is invoked once per attempt and must build a fresh request each
    /// time.
    ///
    /// # Arguments
    /// * `provider_name` - provider name, for logging
    /// * `op_name` - operation name, for logging
    /// * `op` - the operation to run
    pub async fn run<T, F, Fut>(
        &self,
        provider_name: &str,
        op_name: &str,
        mut op: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < attempts && e.is_retryable() => {
                    let delay = self.delay_for(&e, attempt);
                    log::warn!(
                        "[{}] {} failed (attempt {}/{}), retrying in {:.1}s: {}",
                        provider_name,
                        op_name,
                        attempt + 1,
                        attempts,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NetworkError {
            provider: provider_name.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}
