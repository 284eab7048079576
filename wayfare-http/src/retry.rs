use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Retry schedule shared by every external call: up to `max_attempts`
/// tries with exponential backoff starting at `base_delay` and doubling
/// per attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }
}

/// Delay before the retry following `attempt` (1-based): base, 2x base,
/// 4x base, ...
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Generic retry combinator for non-HTTP operations (storage writes use
/// this too, so retry policy is defined in one place). `retryable`
/// decides whether an error is worth another attempt.
pub async fn retry_async<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
    retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts || !retryable(&err) {
                    return Err(err);
                }
                let delay = backoff_delay(policy, attempt);
                tracing::warn!(
                    "{} failed on attempt {}/{} ({}), retrying in {:?}",
                    label,
                    attempt,
                    policy.max_attempts,
                    err,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(backoff_delay(&policy, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(&policy, 3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_async(
            &policy,
            "flaky",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(format!("boom {}", n))
                    } else {
                        Ok(n)
                    }
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_async(
            &policy,
            "always-down",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("down".to_string()) }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_immediately() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_async(
            &policy,
            "fatal",
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_string()) }
            },
            |e| !e.contains("bad request"),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
