use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::errors::ProviderError;

/// Bounded exponential backoff for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped = base.min(self.max_delay_ms);
        let jitter = rand::rng().random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

/// Run `op` under `timeout`, retrying transient failures per `policy`.
/// Elapsed timeouts count as transient; non-transient errors fail the call
/// on first occurrence.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    what: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, op()).await {
            Ok(inner) => inner,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!("{} failed ({}), retrying in {:?}", what, err, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay_ms: 1,
            max_delay_ms: 4,
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicUsize::new(0);
        let result = call_with_retry(&fast_policy(3), Duration::from_secs(1), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::Network("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_fail_immediately() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> =
            call_with_retry(&fast_policy(3), Duration::from_secs(1), "op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProviderError::Status {
                        code: 401,
                        message: "bad key".into(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> =
            call_with_retry(&fast_policy(3), Duration::from_secs(1), "op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::Network("still down".into())) }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_calls_hit_the_timeout() {
        let started = Instant::now();
        let result: Result<(), _> =
            call_with_retry(&fast_policy(1), Duration::from_millis(50), "op", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
