// Retry policy for query fetches

use crate::error::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * 2^retry`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero means a single attempt.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub const fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(max_retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Exponential { base, max },
        }
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

impl RetryPolicy {
    /// Three retries, 100ms doubling to at most 30s.
    pub const fn standard() -> Self {
        Self::exponential(3, Duration::from_millis(100), Duration::from_secs(30))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Transient failures only. Validation, auth and missing resources fail fast.
pub fn is_retryable(error: &AppError) -> bool {
    match error {
        AppError::Network(_) | AppError::TimeoutError(_) => true,
        AppError::Remote { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

pub async fn run_with_retry<F, Fut, T>(policy: &RetryPolicy, label: &str, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < policy.max_retries && is_retryable(&err) => {
                let delay = policy.delay_for(retry);
                debug!("{} failed ({}), retry {} in {:?}", label, err, retry + 1, delay);
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(err) => {
                if retry > 0 {
                    warn!("{} failed after {} retries: {}", label, retry, err);
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = RetryPolicy::exponential(10, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(40), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = RetryPolicy::fixed(2, Duration::from_millis(10));
        let result = run_with_retry(&policy, "flaky", move || async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(AppError::Network("reset".into()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_validation_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: AppResult<()> = run_with_retry(&RetryPolicy::standard(), "create", move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Validation("name is required".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
