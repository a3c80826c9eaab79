//! Retry policies, timeouts and request logging for the e-signature API

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{LogLevel, MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder, TimeoutConfig};
pub use logging::{ApiLogger, OperationContext};
pub use retry::{RequestFailure, RetryConfig, RetryPolicy, RetryableError};
