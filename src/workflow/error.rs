//! Error types for workflow preparation and submission

use std::fmt;
use thiserror::Error;

/// Which liveness check rejected a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// `is_active`/`status` on the workflow's reference
    Reference,
    /// `status`/`is_active` on the template object embedded in the reference
    NestedTemplate,
    /// `is_active`/`status` on the template as fetched
    Fetched,
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Reference => write!(f, "workflow reference"),
            FilterStage::NestedTemplate => write!(f, "embedded template"),
            FilterStage::Fetched => write!(f, "fetched template"),
        }
    }
}

/// Why one template reference was left out. Never fatal for the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("reference #{position} has no usable template id")]
    MissingTemplateId { position: usize },

    #[error("template {} at reference #{position} is inactive ({stage})", template_id.as_deref().unwrap_or("<unknown>"))]
    Inactive {
        position: usize,
        template_id: Option<String>,
        stage: FilterStage,
    },

    #[error("failed to fetch template {template_id} at reference #{position}: {message}")]
    Fetch {
        position: usize,
        template_id: String,
        message: String,
    },

    #[error("template {template_id} at reference #{position} came back malformed: {message}")]
    MalformedEnvelope {
        position: usize,
        template_id: String,
        message: String,
    },
}

impl ResolutionError {
    pub fn position(&self) -> usize {
        match self {
            ResolutionError::MissingTemplateId { position }
            | ResolutionError::Inactive { position, .. }
            | ResolutionError::Fetch { position, .. }
            | ResolutionError::MalformedEnvelope { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("no recipient role '{0}' in this workflow")]
    UnknownRole(String),
}

/// The two calls of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Create,
    Send,
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionPhase::Create => write!(f, "create"),
            SubmissionPhase::Send => write!(f, "send"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("cannot submit: no contact bound for {}", roles.join(", "))]
    IncompleteBinding { roles: Vec<String> },

    #[error("workflow response was created but the service returned no response id")]
    ResponseIdMissing,

    #[error("failed to {phase} workflow response: {message}")]
    Transport {
        phase: SubmissionPhase,
        message: String,
    },

    #[error("workflow response {response_id} has already been sent")]
    AlreadySent { response_id: String },

    #[error("no created workflow response is waiting to be sent")]
    NothingToResend,
}

impl SubmissionError {
    /// Phase the failure belongs to, if it happened during a call.
    pub fn phase(&self) -> Option<SubmissionPhase> {
        match self {
            SubmissionError::ResponseIdMissing => Some(SubmissionPhase::Create),
            SubmissionError::Transport { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
