//! Fixed-delay retry for transient failures
//!
//! Unlike a backoff strategy, every retry waits the same configured delay.
//! The caller decides which errors are transient; any other error is returned
//! immediately without further attempts.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Attempt budget and delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Why a retried operation gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation failed with an error the caller does not retry
    Permanent(E),
    /// Every attempt failed with a transient error; `last` is the final one
    Exhausted { attempts: u32, last: E },
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempt budget is spent.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "attendance submission")
/// * `policy` - Attempt budget and fixed delay
/// * `is_transient` - Classifies an error as retryable
/// * `operation` - Async closure performing one attempt
pub async fn retry_fixed<F, Fut, T, E, P>(
    operation_name: &str,
    policy: RetryPolicy,
    is_transient: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(
                operation = operation_name,
                attempt,
                max_attempts,
                "Retrying operation"
            );
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient(&err) {
                    return Err(RetryError::Permanent(err));
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        error = %err,
                        "Operation failed: attempts exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after delay"
                );

                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn always_transient(_: &String) -> bool {
        true
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_attempt_without_delay() {
        let start = Instant::now();
        let result = retry_fixed("test_op", RetryPolicy::default(), always_transient, || async {
            Ok::<i32, String>(42)
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_fixed(
            "test_op",
            RetryPolicy::default(),
            |e: &String| e != "rejected",
            || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), String>("rejected".to_string())
            },
        )
        .await;

        assert_eq!(result, Err(RetryError::Permanent("rejected".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        let counter = &calls;
        let start = Instant::now();

        let result = retry_fixed("test_op", policy, always_transient, || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Err::<(), String>(format!("failure {}", n))
        })
        .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 4,
                last: "failure 4".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(750), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(1000), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
