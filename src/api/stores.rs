//! Collaborator interfaces consumed by the workflow core
//!
//! [`crate::api::EsignClient`] implements all of them over HTTP; tests supply
//! in-memory versions.

use async_trait::async_trait;
use serde_json::Value;

use crate::workflow::models::{Contact, Workflow, WorkflowResponsePayload};

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn get_workflow(&self, workflow_id: &str) -> anyhow::Result<Workflow>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Raw response body; the envelope shape is not guaranteed.
    async fn get_template(&self, template_id: &str, company_id: &str) -> anyhow::Result<Value>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn list_contacts(
        &self,
        company_id: &str,
        contact_type: Option<&str>,
    ) -> anyhow::Result<Vec<Contact>>;
}

#[async_trait]
pub trait WorkflowResponseService: Send + Sync {
    /// Raw response body; where the new id sits is not guaranteed.
    async fn create_response(
        &self,
        workflow_id: &str,
        payload: &WorkflowResponsePayload,
    ) -> anyhow::Result<Value>;

    async fn send_response(&self, workflow_id: &str, response_id: &str) -> anyhow::Result<()>;
}
