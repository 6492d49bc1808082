use std::future::Future;
use std::time::Duration;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Fixed-delay retry. `max_attempts = None` retries until the operation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    delay: Duration,
}

impl RetryPolicy {
    pub fn forever(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        assert!(max_attempts > 0, "retry max_attempts must be > 0");
        Self {
            max_attempts: Some(max_attempts),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }

    /// Run `op` until it succeeds or the attempt budget is spent, sleeping `delay` between tries.
    /// Returns the last error once exhausted.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => {
                    if attempt > 1 {
                        tracing::info!(op = label, attempt, "Succeeded after retry");
                    }
                    return Ok(v);
                }
                Err(e) if self.exhausted(attempt) => {
                    tracing::error!(op = label, attempt, error = %e, "Giving up after retries");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        op = label,
                        attempt,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(DEFAULT_RETRY_DELAY)
    }
}
