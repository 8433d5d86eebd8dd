//! Retry policy for remote provisioning steps.

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, ExponentialBuilder, Retryable};
use edc_hw_core::HuaweiCloudConfig;
use tracing::warn;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// Doubling delay with jitter, capped at the maximum delay.
    Exponential,
    /// The minimum delay between every attempt.
    Fixed,
}

/// Bounded retries with backoff.
///
/// `max_attempts` counts the first call, so `1` disables retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Backoff shape.
    pub kind: BackoffKind,
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// First (or fixed) delay.
    pub min_delay: Duration,
    /// Delay cap for exponential backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HuaweiCloudConfig::default())
    }
}

impl RetryPolicy {
    /// Policy from the `OBS_PROVISION_RETRY_*` settings.
    #[must_use]
    pub fn from_config(config: &HuaweiCloudConfig) -> Self {
        Self {
            kind: if config.retry_fixed_delay {
                BackoffKind::Fixed
            } else {
                BackoffKind::Exponential
            },
            max_attempts: config.retry_max_attempts,
            min_delay: Duration::from_millis(config.retry_min_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            kind: BackoffKind::Fixed,
            max_attempts: 1,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Fixed-delay policy.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            kind: BackoffKind::Fixed,
            max_attempts,
            min_delay: delay,
            max_delay: delay,
        }
    }

    fn retries(&self) -> usize {
        self.max_attempts.saturating_sub(1) as usize
    }

    /// Run `operation`, retrying errors for which `retryable` holds.
    ///
    /// The last error is returned once attempts are exhausted.
    pub async fn run<T, E, F, Fut, R>(&self, step: &str, operation: F, retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let notify = |err: &E, delay: Duration| {
            warn!(step, error = %err, delay_ms = delay.as_millis(), "retrying after error");
        };

        match self.kind {
            BackoffKind::Exponential => {
                let backoff = ExponentialBuilder::default()
                    .with_min_delay(self.min_delay)
                    .with_max_delay(self.max_delay.max(self.min_delay))
                    .with_max_times(self.retries())
                    .with_jitter();
                operation
                    .retry(backoff)
                    .when(retryable)
                    .notify(notify)
                    .await
            }
            BackoffKind::Fixed => {
                let backoff = ConstantBuilder::default()
                    .with_delay(self.min_delay)
                    .with_max_times(self.retries());
                operation
                    .retry(backoff)
                    .when(retryable)
                    .notify(notify)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Failure(bool);

    impl std::fmt::Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "failure (retryable: {})", self.0)
        }
    }

    #[test]
    fn test_should_build_policy_from_config() {
        let config = HuaweiCloudConfig::builder()
            .retry_max_attempts(5)
            .retry_min_delay_ms(10)
            .retry_max_delay_ms(20)
            .retry_fixed_delay(true)
            .build();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.kind, BackoffKind::Fixed);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.min_delay, Duration::from_millis(10));
        assert_eq!(RetryPolicy::default().kind, BackoffKind::Exponential);
    }

    #[tokio::test]
    async fn test_should_retry_retryable_errors_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::fixed(3, Duration::from_millis(1));
        let result: Result<(), Failure> = policy
            .run(
                "test",
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure(true))
                },
                |e: &Failure| e.0,
            )
            .await;
        assert_eq!(result, Err(Failure(true)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_should_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy {
            kind: BackoffKind::Exponential,
            max_attempts: 4,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let result: Result<(), Failure> = policy
            .run(
                "test",
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Failure(false))
                },
                |e: &Failure| e.0,
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_should_return_first_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::fixed(5, Duration::from_millis(1));
        let result = policy
            .run(
                "test",
                move || async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Failure(true))
                    } else {
                        Ok(42)
                    }
                },
                |e: &Failure| e.0,
            )
            .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
