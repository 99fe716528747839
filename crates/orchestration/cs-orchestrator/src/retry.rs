//! Retry execution with exponential backoff and jitter.

use crate::config::ScanConfig;
use cs_error::{classify, ApiError, ErrorCategory};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A terminal call failure, carrying how many invocations were made.
#[derive(Debug)]
pub struct Attempted {
    /// The error from the final attempt
    pub error: ApiError,

    /// Invocations actually made (initial attempt included)
    pub attempts: u32,
}

impl Attempted {
    /// Whether the final error class was retryable.
    pub fn retryable(&self) -> bool {
        classify(&self.error) == ErrorCategory::Retryable
    }
}

/// Backoff policy for one scan run.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Multiplier applied per retry
    pub multiplier: f64,

    /// Fraction of the computed delay randomized as jitter
    pub jitter_fraction: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            multiplier: config.backoff_multiplier,
            jitter_fraction: config.jitter_fraction,
        }
    }

    /// Backoff before retry number `attempt` (0-based), jitter included.
    ///
    /// `base * multiplier^attempt` plus a uniform jitter in
    /// `[0, jitter_fraction * computed]`, capped at [`MAX_BACKOFF`].
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(MAX_BACKOFF.as_secs_f64());

        let jittered = if self.jitter_fraction > 0.0 {
            let jitter = rand::rng().random_range(0.0..=self.jitter_fraction * capped);
            capped + jitter
        } else {
            capped
        };

        Duration::from_secs_f64(jittered.min(MAX_BACKOFF.as_secs_f64()).max(0.0))
    }

    /// Execute an async operation under this policy.
    ///
    /// Retryable failures back off and retry until `max_retries` is
    /// exhausted (at most `max_retries + 1` invocations); fatal failures
    /// return immediately without consuming a retry. Backoff sleeps that
    /// would run past `deadline` fail as a timeout instead, so an expiring
    /// task never blocks on a useless wait. On success the invocation
    /// count is returned alongside the value.
    pub async fn run<F, Fut, T>(
        &self,
        operation_name: &str,
        deadline: Instant,
        mut operation: F,
    ) -> Result<(T, u32), Attempted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(value) => return Ok((value, attempt + 1)),
                Err(error) => {
                    if classify(&error) == ErrorCategory::Fatal {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            error = %error,
                            "Fatal error, not retrying"
                        );
                        return Err(Attempted {
                            error,
                            attempts: attempt + 1,
                        });
                    }

                    if attempt < self.max_retries {
                        let backoff = self.backoff_delay(attempt);
                        if Instant::now() + backoff > deadline {
                            warn!(
                                operation = operation_name,
                                attempt = attempt + 1,
                                "Deadline would elapse during backoff, abandoning retries"
                            );
                            return Err(Attempted {
                                error: ApiError::Timeout(
                                    "deadline elapsed during retry backoff".to_string(),
                                ),
                                attempts: attempt + 1,
                            });
                        }

                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            error = %error,
                            backoff_ms = backoff.as_millis() as u64,
                            "Retryable error, backing off"
                        );
                        sleep(backoff).await;
                    }

                    last_error = Some(error);
                }
            }
        }

        Err(Attempted {
            error: last_error.unwrap_or_else(|| {
                ApiError::Other("retry loop exited without an error".to_string())
            }),
            attempts: self.max_retries + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            jitter_fraction: 0.0,
        }
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn test_backoff_delay_growth() {
        let policy = fast_policy(3);
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(4));
    }

    #[test]
    fn test_backoff_delay_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_secs(10),
            multiplier: 10.0,
            jitter_fraction: 0.0,
        };
        assert_eq!(policy.backoff_delay(5), MAX_BACKOFF);
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 1.0,
            jitter_fraction: 0.25,
        };
        for _ in 0..100 {
            let delay = policy.backoff_delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(125));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = policy
            .run("test_op", far_deadline(), || {
                let n = calls_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ApiError::Throttle("rate exceeded".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        let (value, attempts) = result.unwrap();
        assert_eq!(value, 42);
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<((), u32), Attempted> = policy
            .run("test_op", far_deadline(), || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::TransientNetwork("503".into())) }
            })
            .await;

        let attempted = result.unwrap_err();
        // Initial attempt + 3 retries
        assert_eq!(attempted.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(attempted.retryable());
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let policy = fast_policy(3);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<((), u32), Attempted> = policy
            .run("test_op", far_deadline(), || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Auth("AccessDenied".into())) }
            })
            .await;

        let attempted = result.unwrap_err();
        assert_eq!(attempted.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!attempted.retryable());
    }

    #[tokio::test]
    async fn test_deadline_cuts_backoff_short() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_fraction: 0.0,
        };
        let deadline = Instant::now() + Duration::from_millis(50);

        let start = Instant::now();
        let result: Result<((), u32), Attempted> = policy
            .run("test_op", deadline, || async {
                Err(ApiError::Throttle("rate exceeded".into()))
            })
            .await;

        let attempted = result.unwrap_err();
        assert!(matches!(attempted.error, ApiError::Timeout(_)));
        assert_eq!(attempted.attempts, 1);
        // Must not have slept the 10s backoff
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_retries_single_attempt() {
        let policy = fast_policy(0);
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<((), u32), Attempted> = policy
            .run("test_op", far_deadline(), || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::Throttle("rate exceeded".into())) }
            })
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
