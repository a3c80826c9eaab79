//! Two-phase submission: create a workflow response, then send it
//!
//! ```text
//! Idle -> Creating -> Created -> Sending -> Sent
//!            |                      |
//!            +------> Failed <------+
//! ```
//!
//! Neither call is retried automatically. A failed send keeps the created
//! response id so [`Submission::retry_send`] can finish that response instead
//! of creating another one.

use log::{error, info, warn};
use serde_json::Value;

use super::binding::RecipientBindings;
use super::error::{SubmissionError, SubmissionPhase};
use super::models::WorkflowResponsePayload;
use crate::api::envelope;
use crate::api::stores::WorkflowResponseService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Creating,
    Created { response_id: String },
    Sending { response_id: String },
    Sent { response_id: String },
    Failed {
        phase: SubmissionPhase,
        /// Set when the response exists server-side but was not sent
        response_id: Option<String>,
        reason: String,
    },
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Creating => "creating",
            SubmissionState::Created { .. } => "created",
            SubmissionState::Sending { .. } => "sending",
            SubmissionState::Sent { .. } => "sent",
            SubmissionState::Failed { .. } => "failed",
        }
    }
}

/// New response id, tried at `data.data._id`, `data._id`, `_id`, `id`.
pub fn extract_response_id(raw: &Value) -> Option<String> {
    envelope::first_id(raw, envelope::RESPONSE_ID_PATHS)
}

pub struct Submission<'a, S: WorkflowResponseService + ?Sized> {
    service: &'a S,
    workflow_id: String,
    state: SubmissionState,
}

impl<'a, S: WorkflowResponseService + ?Sized> Submission<'a, S> {
    pub fn new(service: &'a S, workflow_id: impl Into<String>) -> Self {
        Self {
            service,
            workflow_id: workflow_id.into(),
            state: SubmissionState::Idle,
        }
    }

    /// Resume a response that was created earlier but never sent.
    pub fn resume(service: &'a S, workflow_id: impl Into<String>, response_id: impl Into<String>) -> Self {
        Self {
            service,
            workflow_id: workflow_id.into(),
            state: SubmissionState::Created {
                response_id: response_id.into(),
            },
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Run create then send. Returns the sent response id.
    ///
    /// Blocked (state unchanged) while any non-sender role is unbound. Calling
    /// again after a failure creates a new response.
    pub async fn submit(
        &mut self,
        bindings: &RecipientBindings,
        payload: &WorkflowResponsePayload,
    ) -> Result<String, SubmissionError> {
        if let SubmissionState::Sent { response_id } = &self.state {
            return Err(SubmissionError::AlreadySent {
                response_id: response_id.clone(),
            });
        }

        if !bindings.is_ready() {
            let roles = bindings.incomplete_roles();
            warn!("Submission blocked, unbound roles: {}", roles.join(", "));
            return Err(SubmissionError::IncompleteBinding { roles });
        }

        let response_id = self.create(payload).await?;
        self.send(response_id).await
    }

    /// Re-issue only the send call for a response that already exists.
    pub async fn retry_send(&mut self) -> Result<String, SubmissionError> {
        let response_id = match &self.state {
            SubmissionState::Created { response_id } => response_id.clone(),
            SubmissionState::Failed {
                phase: SubmissionPhase::Send,
                response_id: Some(response_id),
                ..
            } => response_id.clone(),
            SubmissionState::Sent { response_id } => {
                return Err(SubmissionError::AlreadySent {
                    response_id: response_id.clone(),
                })
            }
            _ => return Err(SubmissionError::NothingToResend),
        };

        info!("Retrying send of workflow response {}", response_id);
        self.send(response_id).await
    }

    async fn create(&mut self, payload: &WorkflowResponsePayload) -> Result<String, SubmissionError> {
        self.state = SubmissionState::Creating;
        info!(
            "Creating workflow response for {} ({} templates, {} users)",
            self.workflow_id,
            payload.document_templates.len(),
            payload.workflow_users.len()
        );

        let outcome = self.service.create_response(&self.workflow_id, payload).await;
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => return Err(self.fail(SubmissionPhase::Create, None, format!("{:#}", e))),
        };

        let Some(response_id) = extract_response_id(&raw) else {
            let err = SubmissionError::ResponseIdMissing;
            self.state = SubmissionState::Failed {
                phase: SubmissionPhase::Create,
                response_id: None,
                reason: err.to_string(),
            };
            error!("Create call for {} returned no response id: {}", self.workflow_id, raw);
            return Err(err);
        };

        info!("Created workflow response {}", response_id);
        self.state = SubmissionState::Created {
            response_id: response_id.clone(),
        };
        Ok(response_id)
    }

    async fn send(&mut self, response_id: String) -> Result<String, SubmissionError> {
        self.state = SubmissionState::Sending {
            response_id: response_id.clone(),
        };

        let outcome = self.service.send_response(&self.workflow_id, &response_id).await;
        match outcome {
            Ok(()) => {
                info!("Sent workflow response {}", response_id);
                self.state = SubmissionState::Sent {
                    response_id: response_id.clone(),
                };
                Ok(response_id)
            }
            Err(e) => Err(self.fail(SubmissionPhase::Send, Some(response_id), format!("{:#}", e))),
        }
    }

    fn fail(&mut self, phase: SubmissionPhase, response_id: Option<String>, message: String) -> SubmissionError {
        error!("Workflow response {} failed for {}: {}", phase, self.workflow_id, message);
        if let Some(id) = &response_id {
            warn!("Workflow response {} exists but was not sent", id);
        }

        self.state = SubmissionState::Failed {
            phase,
            response_id,
            reason: message.clone(),
        };
        SubmissionError::Transport { phase, message }
    }
}
