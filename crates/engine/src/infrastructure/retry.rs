//! Exponential backoff for stage calls.
//!
//! Delays are `base_delay_ms * 2^attempt` with no jitter, so concurrent
//! callers that fail together retry together.

use std::future::Future;
use std::time::Duration;

use crate::infrastructure::ports::GenerationError;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay in milliseconds after the first failed attempt
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Delay after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` attempts are used up. The last error is returned; with no
/// attempts at all the result is an `UNKNOWN_ERROR`.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation_name: &str, operation: F) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    with_retry_observed(config, operation_name, operation, |_, _| {}).await
}

/// [`with_retry`] that reports each retried failure to `on_retry` before
/// sleeping.
pub async fn with_retry_observed<T, F, Fut, R>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
    R: FnMut(u32, &GenerationError),
{
    let mut last_error = None;

    for attempt in 0..config.max_retries {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        attempt = attempt + 1,
                        operation = operation_name,
                        "Stage request succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                tracing::error!(
                    error = %error,
                    operation = operation_name,
                    "Stage request failed with non-retryable error"
                );
                return Err(error);
            }
            Err(error) => {
                if attempt + 1 < config.max_retries {
                    let delay = config.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        operation = operation_name,
                        "Stage request failed, retrying..."
                    );
                    on_retry(attempt + 1, &error);
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(error);
            }
        }
    }

    let error = last_error.unwrap_or_else(|| {
        GenerationError::unknown(format!("{} made no attempts (max_retries = 0)", operation_name))
    });
    tracing::error!(
        attempts = config.max_retries,
        error = %error,
        operation = operation_name,
        "Stage request failed after all retry attempts"
    );
    Err(error)
}
