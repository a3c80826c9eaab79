//! E-signature REST API access
//!
//! [`stores`] defines the collaborator traits the workflow core talks to;
//! [`EsignClient`] implements them over HTTP.

pub mod client;
pub mod constants;
pub mod envelope;
pub mod manager;
pub mod resilience;
pub mod stores;

pub use client::EsignClient;
pub use manager::{ClientManager, Connection};
pub use resilience::{ResilienceConfig, RetryConfig, RetryPolicy};
pub use stores::{ContactStore, TemplateStore, WorkflowResponseService, WorkflowStore};
