//! Resilience configuration with builder pattern
//!
//! Groups read retries, HTTP timeouts and request monitoring for one client.

use super::retry::RetryConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub timeouts: TimeoutConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutConfig {
    pub request: Duration,
    pub connect: Duration,
    pub pool_idle: Duration,
    pub pool_max_idle_per_host: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringConfig {
    /// Tag each request with an `X-Correlation-ID` header
    pub correlation_ids: bool,
    pub request_logging: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
            pool_idle: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: true,
            request_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Fewer retries and quieter logs
    pub fn conservative() -> Self {
        Self {
            retry: RetryConfig::conservative(),
            timeouts: TimeoutConfig::default(),
            monitoring: MonitoringConfig {
                log_level: LogLevel::Warn,
                ..MonitoringConfig::default()
            },
        }
    }

    /// More retries, longer timeouts, verbose logs
    pub fn development() -> Self {
        Self {
            retry: RetryConfig::aggressive(),
            timeouts: TimeoutConfig {
                request: Duration::from_secs(60),
                ..TimeoutConfig::default()
            },
            monitoring: MonitoringConfig {
                log_level: LogLevel::Debug,
                ..MonitoringConfig::default()
            },
        }
    }

    /// One attempt per read and no request logging (for testing)
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::none(),
            timeouts: TimeoutConfig::default(),
            monitoring: MonitoringConfig {
                correlation_ids: false,
                request_logging: false,
                log_level: LogLevel::Error,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn max_read_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.request = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.connect = timeout;
        self
    }

    pub fn correlation_ids(mut self, enabled: bool) -> Self {
        self.config.monitoring.correlation_ids = enabled;
        self
    }

    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.monitoring.request_logging = enabled;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.monitoring.log_level = level;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
