//! Retry with jittered exponential backoff
//!
//! Both collaborator clients wrap individual HTTP requests in
//! [`with_retry`]. A request that still fails after the final attempt
//! surfaces as that row's error; the batch itself is never retried.

use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;

/// Retry behavior for a single outbound request.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Add up to 25% random delay on top of the backoff.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry following the given 1-based attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let mut delay = self.base_delay.mul_f64(exponent);
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        if self.jitter {
            delay = delay.mul_f64(1.0 + rand::rng().random_range(0.0..0.25));
        }
        delay
    }
}

/// Run `op` until it succeeds or `max_attempts` is exhausted.
///
/// The closure builds a fresh future per attempt. Failures between attempts
/// are logged at `warn`; the final failure is returned unchanged.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, what: &str, mut op: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_attempts => {
                let delay = config.delay_after(attempt);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {:#}",
                    what, attempt, config.max_attempts, delay, err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_config(3), "flaky op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    anyhow::bail!("transient");
                }
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: anyhow::Result<()> = with_retry(&fast_config(2), "doomed op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { anyhow::bail!("permanent") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_is_capped_at_max_delay() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(config.delay_after(1), Duration::from_secs(10));
        assert_eq!(config.delay_after(5), Duration::from_secs(15));
    }
}
