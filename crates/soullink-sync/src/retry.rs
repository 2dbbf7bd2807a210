//! Bounded exponential backoff for remote writes

use crate::config::RetryConfig;
use crate::error::RemoteError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy built from [`RetryConfig`]
///
/// Only errors with [`RemoteError::is_retryable`] are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Total attempts, including the first
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.config.max_attempts
    }

    #[allow(clippy::cast_possible_truncation)]
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.initial_backoff())
            .with_max_delay(self.config.max_backoff())
            .with_factor(self.config.backoff_multiplier as f32)
            .with_max_times(self.config.max_attempts.saturating_sub(1))
    }

    /// Run `operation`, retrying transient failures
    ///
    /// # Errors
    /// The last error once attempts are exhausted, or the first permanent one.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        operation
            .retry(self.backoff())
            .when(RemoteError::is_retryable)
            .notify(|err: &RemoteError, delay: Duration| {
                warn!(error = %err, delay_ms = delay.as_millis(), "remote write failed, retrying");
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
            backoff_multiplier: 2.0,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors() {
        let calls = AtomicUsize::new(0);
        let result = policy(3)
            .run(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RemoteError::Unavailable("flaky".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = policy(2)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Unavailable("down".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = policy(5)
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Rejected("denied".into()))
            })
            .await;

        assert_eq!(result, Err(RemoteError::Rejected("denied".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
