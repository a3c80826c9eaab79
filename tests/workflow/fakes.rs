//! In-memory collaborators for driving the workflow core without HTTP

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use esign_cli::api::{ContactStore, TemplateStore, WorkflowResponseService, WorkflowStore};
use esign_cli::workflow::{Contact, SessionContext, Workflow, WorkflowResponsePayload};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn session() -> SessionContext {
    SessionContext::new("user-1", "company-1")
}

/// A template wrapped the way the API usually returns it.
pub fn template(id: &str, title: &str, users: Value) -> Value {
    json!({
        "success": true,
        "data": {
            "_id": id,
            "title": title,
            "is_active": true,
            "status": "ACTIVE",
            "document_users": users
        }
    })
}

pub fn receiver(role: &str) -> Value {
    json!({"role": role, "type": "RECEIVER", "user_type": "SIGNER", "e_signature_required": true})
}

pub fn sender() -> Value {
    json!({"role": "sender", "type": "SENDER", "user_type": "SENDER"})
}

pub fn contact(id: &str, first_name: &str, email: &str) -> Value {
    json!({"_id": id, "first_name": first_name, "last_name": "Tester", "email": email})
}

#[derive(Default)]
pub struct FakeBackend {
    workflows: HashMap<String, Value>,
    templates: HashMap<String, Value>,
    failing_templates: HashSet<String>,
    template_delays: HashMap<String, Duration>,
    contacts: Vec<Value>,
    create_reply: Option<Value>,
    fail_create: bool,
    failing_sends: AtomicUsize,
    pub template_fetches: Mutex<Vec<String>>,
    /// Template ids in the order their fetches finished
    pub template_completions: Mutex<Vec<String>>,
    pub contact_queries: Mutex<Vec<Option<String>>>,
    pub created: Mutex<Vec<(String, WorkflowResponsePayload)>>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflow(mut self, id: &str, raw: Value) -> Self {
        self.workflows.insert(id.to_string(), raw);
        self
    }

    pub fn with_template(mut self, id: &str, raw: Value) -> Self {
        self.templates.insert(id.to_string(), raw);
        self
    }

    pub fn with_failing_template(mut self, id: &str) -> Self {
        self.failing_templates.insert(id.to_string());
        self
    }

    /// Hold the fetch of `id` for `millis` before answering.
    pub fn with_template_delay(mut self, id: &str, millis: u64) -> Self {
        self.template_delays.insert(id.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn with_contact(mut self, raw: Value) -> Self {
        self.contacts.push(raw);
        self
    }

    pub fn with_create_reply(mut self, raw: Value) -> Self {
        self.create_reply = Some(raw);
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// The next `count` send calls fail.
    pub fn failing_sends(self, count: usize) -> Self {
        self.failing_sends.store(count, Ordering::SeqCst);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.template_fetches.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.template_completions.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowStore for FakeBackend {
    async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow> {
        let raw = self
            .workflows
            .get(workflow_id)
            .ok_or_else(|| anyhow!("HTTP 404: workflow {} not found", workflow_id))?;
        Ok(serde_json::from_value(raw.clone())?)
    }
}

#[async_trait]
impl TemplateStore for FakeBackend {
    async fn get_template(&self, template_id: &str, _company_id: &str) -> Result<Value> {
        self.template_fetches.lock().unwrap().push(template_id.to_string());

        if let Some(delay) = self.template_delays.get(template_id) {
            tokio::time::sleep(*delay).await;
        }
        self.template_completions
            .lock()
            .unwrap()
            .push(template_id.to_string());

        if self.failing_templates.contains(template_id) {
            return Err(anyhow!("HTTP 500: template service unavailable"));
        }
        self.templates
            .get(template_id)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404: template {} not found", template_id))
    }
}

#[async_trait]
impl ContactStore for FakeBackend {
    async fn list_contacts(&self, _company_id: &str, contact_type: Option<&str>) -> Result<Vec<Contact>> {
        self.contact_queries
            .lock()
            .unwrap()
            .push(contact_type.map(String::from));

        let contacts = self
            .contacts
            .iter()
            .map(|raw| serde_json::from_value::<Contact>(raw.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(contacts
            .into_iter()
            .filter(|c| contact_type.is_none() || c.contact_type.as_deref() == contact_type)
            .collect())
    }
}

#[async_trait]
impl WorkflowResponseService for FakeBackend {
    async fn create_response(&self, workflow_id: &str, payload: &WorkflowResponsePayload) -> Result<Value> {
        self.created
            .lock()
            .unwrap()
            .push((workflow_id.to_string(), payload.clone()));

        if self.fail_create {
            return Err(anyhow!("HTTP 502: bad gateway"));
        }
        Ok(self
            .create_reply
            .clone()
            .unwrap_or_else(|| json!({"success": true, "data": {"data": {"_id": "r1"}}})))
    }

    async fn send_response(&self, workflow_id: &str, response_id: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((workflow_id.to_string(), response_id.to_string()));

        let remaining = self.failing_sends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_sends.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("HTTP 503: mail relay unavailable"));
        }
        Ok(())
    }
}
