//! Retry logic.
//!
//! # Responsibilities
//! - Execute an idempotent upstream read
//! - On failure, wait with exponential backoff and try again
//! - Surface only the last failure once the retry budget is spent
//!
//! # Design Decisions
//! - Only reads go through here; nothing with side effects is retried
//! - Every failure is retryable; timeouts count as failures
//! - The delay suspends the calling task only (`tokio::time::sleep`)

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry policy for a single logical read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. Zero means fail on first error.
    pub max_retries: u32,
    /// Base delay; retry `i` waits `2^i × base_delay`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay awaited before retry `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_delay)
    }
}

/// What an operation knows about the attempt it is running as.
///
/// The outcome of an attempt is not recorded here; failures are logged as
/// they happen and only the last one is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1 for the initial call, 2 for the first retry, and so on.
    pub number: u32,
    /// Backoff that elapsed right before this attempt.
    pub delay: Duration,
}

impl Attempt {
    fn first() -> Self {
        Self {
            number: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Run `op` until it succeeds or `policy.max_retries` retries have failed.
///
/// `operation` names the call in logs and metrics.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = Attempt::first();
    let mut retries = 0u32;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                retries += 1;
                if retries > policy.max_retries {
                    tracing::warn!(
                        operation,
                        attempts = attempt.number,
                        error = %err,
                        "Upstream call failed"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for(retries);
                tracing::warn!(
                    operation,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying upstream call"
                );
                metrics::record_retry(operation);

                tokio::time::sleep(delay).await;
                attempt = Attempt {
                    number: retries + 1,
                    delay,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_makes_k_plus_one_attempts() {
        for k in 0..=4 {
            let mut attempts = Vec::new();
            let result: Result<(), String> = retry_with_backoff(&policy(k), "test", |attempt| {
                attempts.push(attempt);
                async move { Err(format!("boom {}", attempt.number)) }
            })
            .await;

            assert_eq!(attempts.len() as u32, k + 1);
            assert_eq!(result.unwrap_err(), format!("boom {}", k + 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_double_per_retry() {
        let mut attempts = Vec::new();
        let start = Instant::now();
        let _: Result<(), &str> = retry_with_backoff(&policy(3), "test", |attempt| {
            attempts.push(attempt);
            async { Err("down") }
        })
        .await;

        let delays: Vec<u128> = attempts.iter().map(|a| a.delay.as_millis()).collect();
        assert_eq!(delays, vec![0, 1000, 2000, 4000]);
        assert_eq!(start.elapsed(), Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let mut attempts = Vec::new();
        let start = Instant::now();
        let result = retry_with_backoff(&policy(3), "test", |attempt| {
            attempts.push(attempt);
            async move {
                if attempt.number < 3 {
                    Err("flaky")
                } else {
                    Ok(format!("payload from attempt {}", attempt.number))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "payload from attempt 3");
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[1].delay, Duration::from_millis(1000));
        assert_eq!(attempts[2].delay, Duration::from_millis(2000));
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fails_immediately() {
        let start = Instant::now();
        let mut calls = 0;
        let result: Result<(), &str> = retry_with_backoff(&RetryPolicy::none(), "test", |_| {
            calls += 1;
            async { Err("nope") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_does_not_wait() {
        let start = Instant::now();
        let result: Result<u8, &str> =
            retry_with_backoff(&policy(3), "test", |_| async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
