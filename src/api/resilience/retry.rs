//! Retry policies with exponential backoff
//!
//! Only idempotent reads go through [`RetryPolicy`]. Creating and sending a
//! workflow response are issued once by the client.

use log::{debug, info, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
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
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.5,
            jitter: true,
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection refused, DNS, reset
    Network,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 429
    RateLimited,
    /// HTTP 408 or a client-side timeout
    Timeout,
    /// 4xx other than 401, 403, 408, 429
    ClientError(u16),
    /// 401/403, the token is wrong or lacks access
    AuthError,
    Unknown,
}

impl RetryableError {
    pub fn should_retry(&self) -> bool {
        matches!(
            self,
            RetryableError::Network
                | RetryableError::ServerError(_)
                | RetryableError::RateLimited
                | RetryableError::Timeout
        )
    }

    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => RetryableError::AuthError,
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// One failed HTTP exchange
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestFailure {
    pub fn classify(&self) -> RetryableError {
        match self {
            RequestFailure::Transport(e) => RetryableError::from_reqwest_error(e),
            RequestFailure::Status { status, .. } => RetryableError::from_status_code(*status),
            RequestFailure::Decode(_) => RetryableError::Unknown,
        }
    }
}

/// Exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn execute<F, Fut, T>(&self, label: &str, operation: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RequestFailure>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("{} (attempt {}/{})", label, attempt, max_attempts);

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("{} succeeded after {} attempts", label, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            let should_retry = error.classify().should_retry();
            if !should_retry || attempt >= max_attempts {
                warn!(
                    "{} failed permanently on attempt {} (should_retry: {}): {}",
                    label, attempt, should_retry, error
                );
                return Err(anyhow::Error::new(error).context(format!("{} failed", label)));
            }

            let delay = self.calculate_delay(attempt);
            warn!("{} failed on attempt {}, retrying in {:?}: {}", label, attempt, delay, error);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64).min(self.config.max_delay);

        if self.config.jitter {
            let jitter_factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}
