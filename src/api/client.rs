use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::Value;

use super::constants::{self, headers};
use super::envelope;
use super::resilience::{ApiLogger, OperationContext, RequestFailure, ResilienceConfig, RetryPolicy};
use super::stores::{ContactStore, TemplateStore, WorkflowResponseService, WorkflowStore};
use crate::workflow::models::{Contact, Workflow, WorkflowResponsePayload};

/// E-signature REST client with connection pooling
#[derive(Clone)]
pub struct EsignClient {
    base_url: String,
    http_client: reqwest::Client,
    api_token: String,
    retry_policy: RetryPolicy, // reads only
    logger: ApiLogger,
}

impl EsignClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>, resilience: &ResilienceConfig) -> Result<Self> {
        let timeouts = &resilience.timeouts;
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(timeouts.pool_max_idle_per_host)
            .pool_idle_timeout(timeouts.pool_idle)
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .user_agent(constants::USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_custom_client(base_url, api_token, http_client, resilience))
    }

    pub fn with_custom_client(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        http_client: reqwest::Client,
        resilience: &ResilienceConfig,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
            api_token: api_token.into(),
            retry_policy: RetryPolicy::new(resilience.retry.clone()),
            logger: ApiLogger::new(resilience.monitoring.clone()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET with retries on transient failures.
    async fn get_json(&self, operation: &str, target: &str, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let context = self.logger.start_operation(operation, target);
        self.logger.log_request(&context, "GET", url);

        let http_client = &self.http_client;
        let result = self
            .retry_policy
            .execute(operation, || {
                let request = self.authorized(http_client.get(url), &context).query(query);
                async move { read_json(request.send().await?).await }
            })
            .await;

        self.finish(&context, result)
    }

    /// POST exactly once. Create and send are not idempotent.
    async fn post_json<B>(&self, operation: &str, target: &str, url: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let context = self.logger.start_operation(operation, target);
        self.logger.log_request(&context, "POST", url);

        let request = self.authorized(self.http_client.post(url), &context).json(body);
        let result = match request.send().await {
            Ok(response) => read_json(response).await,
            Err(e) => Err(RequestFailure::from(e)),
        }
        .map_err(|e| anyhow::Error::new(e).context(format!("{} failed", operation)));

        self.finish(&context, result)
    }

    fn authorized(&self, request: RequestBuilder, context: &OperationContext) -> RequestBuilder {
        let request = request
            .bearer_auth(&self.api_token)
            .header(headers::ACCEPT, headers::CONTENT_TYPE_JSON);

        if context.correlation_id.is_empty() {
            request
        } else {
            request.header(headers::X_CORRELATION_ID, &context.correlation_id)
        }
    }

    fn finish(&self, context: &OperationContext, result: Result<Value>) -> Result<Value> {
        match &result {
            Ok(_) => self.logger.complete_operation(context, None),
            Err(e) => self.logger.complete_operation(context, Some(&format!("{:#}", e))),
        }
        result
    }
}

/// Body as JSON; non-2xx becomes an error with the body text. Empty bodies read as null.
async fn read_json(response: reqwest::Response) -> Result<Value, RequestFailure> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(RequestFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl WorkflowStore for EsignClient {
    async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow> {
        let url = constants::workflow_endpoint(&self.base_url, workflow_id);
        let raw = self.get_json("get_workflow", workflow_id, &url, &[]).await?;

        let record = envelope::first_object(&raw, envelope::RECORD_PATHS)
            .with_context(|| format!("Workflow {} response contains no record", workflow_id))?;

        serde_json::from_value(Value::Object(record.clone()))
            .with_context(|| format!("Failed to parse workflow {}", workflow_id))
    }
}

#[async_trait]
impl TemplateStore for EsignClient {
    async fn get_template(&self, template_id: &str, company_id: &str) -> Result<Value> {
        let url = constants::template_endpoint(&self.base_url, template_id);
        self.get_json("get_template", template_id, &url, &[("company_id", company_id)])
            .await
    }
}

#[async_trait]
impl ContactStore for EsignClient {
    async fn list_contacts(&self, company_id: &str, contact_type: Option<&str>) -> Result<Vec<Contact>> {
        let url = constants::contacts_endpoint(&self.base_url);
        let mut query = vec![("company_id", company_id)];
        if let Some(kind) = contact_type {
            query.push(("contact_type", kind));
        }

        let raw = self
            .get_json("list_contacts", contact_type.unwrap_or("all"), &url, &query)
            .await?;

        let Some(items) = envelope::first_array(&raw, envelope::LIST_PATHS) else {
            warn!("Contact list response contains no array, treating as empty");
            return Ok(Vec::new());
        };

        let contacts: Vec<Contact> = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Contact>(item.clone()) {
                Ok(contact) => Some(contact),
                Err(e) => {
                    warn!("Skipping malformed contact: {}", e);
                    None
                }
            })
            .collect();

        debug!("Listed {} contacts for company {}", contacts.len(), company_id);
        Ok(contacts)
    }
}

#[async_trait]
impl WorkflowResponseService for EsignClient {
    async fn create_response(&self, workflow_id: &str, payload: &WorkflowResponsePayload) -> Result<Value> {
        let url = constants::workflow_responses_endpoint(&self.base_url, workflow_id);
        self.post_json("create_response", workflow_id, &url, payload).await
    }

    async fn send_response(&self, workflow_id: &str, response_id: &str) -> Result<()> {
        let url = constants::send_response_endpoint(&self.base_url, workflow_id, response_id);
        self.post_json("send_response", response_id, &url, &serde_json::json!({}))
            .await?;
        Ok(())
    }
}
