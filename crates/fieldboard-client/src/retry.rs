//! Bounded retry for the status-transition request path.
//!
//! Policy: transient failures (timeouts, connection errors, 5xx responses)
//! are retried a fixed number of times with a flat backoff. Client-side
//! failures (4xx, including validation rejections) are never retried.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// Default retry configuration: two additional attempts, one second apart.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_MS: u64 = 1000;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Flat delay between attempts
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

impl RetryConfig {
    /// Create a retry config with custom settings
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            max_retries,
            backoff: Duration::from_millis(backoff_ms),
        }
    }

}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Should retry the request
    Retry,
    /// Should not retry - permanent failure
    NoRetry,
}

/// Check if a reqwest error is retryable
pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    // Timeouts and connection failures are transient
    if error.is_timeout() || error.is_connect() {
        tracing::debug!("Transient network error, will retry");
        return RetryDecision::Retry;
    }

    if let Some(status) = error.status() {
        return is_retryable_status(status);
    }

    RetryDecision::NoRetry
}

/// Check if a status code is retryable
pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    // 5xx server errors are transient
    if status.is_server_error() {
        tracing::debug!("Server error ({}), will retry", status);
        return RetryDecision::Retry;
    }

    // 4xx is a client-side problem; retrying would repeat the same rejection
    RetryDecision::NoRetry
}

/// Execute an HTTP request with bounded retry.
///
/// The operation runs at most `1 + max_retries` times. A response with a
/// retryable status is only returned once attempts are exhausted; a
/// non-retryable response or error is returned immediately.
pub async fn with_retry<F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            tracing::info!(
                "Retry attempt {} of {}, waiting {:?}",
                attempt,
                config.max_retries,
                config.backoff
            );
            tokio::time::sleep(config.backoff).await;
        }

        match operation().await {
            Ok(response) => {
                let status = response.status();

                if is_retryable_status(status) == RetryDecision::Retry
                    && attempt < config.max_retries
                {
                    tracing::warn!(
                        "Request returned retryable status {}, attempt {} of {}",
                        status,
                        attempt + 1,
                        config.max_retries + 1
                    );
                    continue;
                }

                if attempt > 0 && status.is_success() {
                    tracing::info!("Request succeeded after {} retries", attempt);
                }
                return Ok(response);
            }
            Err(e) => {
                if is_retryable_error(&e) == RetryDecision::NoRetry {
                    tracing::debug!("Non-retryable error: {}", e);
                    return Err(e);
                }

                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    // All retries exhausted on network errors
    match last_error {
        Some(e) => Err(e),
        // Unreachable: the loop always returns or records an error first
        None => unreachable!("retry loop exited without a result"),
    }
}
