use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::error::AvailabilityError;

/// Bounded retries with exponential backoff around a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(config.retry_max_backoff_ms),
            ..Self::default()
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay after the `failed_attempts`-th failure.
    pub fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1);
        let factor = self.multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, AvailabilityError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AvailabilityError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut failed = 0;

        loop {
            match attempt().await {
                Ok(value) => {
                    if failed > 0 {
                        debug!("{} succeeded after {} failed attempt(s)", operation, failed);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    failed += 1;
                    if failed >= max_attempts {
                        return Err(AvailabilityError::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: failed,
                            last_error: error.to_string(),
                        });
                    }

                    let delay = self.backoff_for(failed);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation, failed, max_attempts, error, delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}
