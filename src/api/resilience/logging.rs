//! Structured request logging with correlation tracking

use super::config::{LogLevel, MonitoringConfig};
use log::{debug, info, warn};
use serde_json::json;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// One logical call: a workflow fetch, a template fetch, a create, a send
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub correlation_id: String,
    pub operation: String,
    pub target: String,
    pub start_time: Instant,
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn start_operation(&self, operation: &str, target: &str) -> OperationContext {
        let correlation_id = if self.config.correlation_ids {
            uuid::Uuid::new_v4().to_string()
        } else {
            String::new()
        };

        let context = OperationContext {
            correlation_id,
            operation: operation.to_string(),
            target: target.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging && self.enabled(LogLevel::Info) {
            let log_data = json!({
                "event": "operation_started",
                "correlation_id": context.correlation_id,
                "operation": context.operation,
                "target": context.target,
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            info!("API Operation Started: {}", log_data);
        }

        context
    }

    pub fn log_request(&self, context: &OperationContext, method: &str, url: &str) {
        if !self.config.request_logging || !self.enabled(LogLevel::Debug) {
            return;
        }

        let log_data = json!({
            "event": "http_request",
            "correlation_id": context.correlation_id,
            "operation": context.operation,
            "method": method,
            "url": url,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        debug!("HTTP Request: {}", log_data);
    }

    pub fn complete_operation(&self, context: &OperationContext, error: Option<&str>) {
        if !self.config.request_logging {
            return;
        }

        let log_data = json!({
            "event": "operation_completed",
            "correlation_id": context.correlation_id,
            "operation": context.operation,
            "target": context.target,
            "success": error.is_none(),
            "duration_ms": context.start_time.elapsed().as_millis(),
            "error": error,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        if error.is_some() {
            if self.enabled(LogLevel::Warn) {
                warn!("API Operation Failed: {}", log_data);
            }
        } else if self.enabled(LogLevel::Info) {
            info!("API Operation Completed: {}", log_data);
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }
}
