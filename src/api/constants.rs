//! Endpoints and headers of the e-signature REST API

pub const API_BASE_PATH: &str = "/api/v1";

pub const USER_AGENT: &str = concat!("esign-cli/", env!("CARGO_PKG_VERSION"));

pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
    pub const X_CORRELATION_ID: &str = "X-Correlation-ID";
}

fn base(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), API_BASE_PATH)
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

pub fn workflow_endpoint(base_url: &str, workflow_id: &str) -> String {
    format!("{}/workflows/{}", base(base_url), segment(workflow_id))
}

pub fn template_endpoint(base_url: &str, template_id: &str) -> String {
    format!("{}/templates/{}", base(base_url), segment(template_id))
}

pub fn contacts_endpoint(base_url: &str) -> String {
    format!("{}/contacts", base(base_url))
}

pub fn workflow_responses_endpoint(base_url: &str, workflow_id: &str) -> String {
    format!("{}/responses", workflow_endpoint(base_url, workflow_id))
}

pub fn send_response_endpoint(base_url: &str, workflow_id: &str, response_id: &str) -> String {
    format!(
        "{}/{}/send",
        workflow_responses_endpoint(base_url, workflow_id),
        segment(response_id)
    )
}
