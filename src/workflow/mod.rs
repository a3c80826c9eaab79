//! Workflow recipient aggregation and response assembly
//!
//! A workflow points at several templates, each with its own recipient roster.
//! This module resolves the live templates, merges recipients that stand for
//! the same role, tracks which contact fills each role, and submits the
//! resulting workflow response.
//!
//! Pipeline: [`resolver`] → [`flatten`] → [`grouping`] → [`binding`] →
//! [`payload`] → [`submission`]. [`preparation`] runs the first three for a
//! workflow id.

pub mod binding;
pub mod error;
pub mod fallback;
pub mod flatten;
pub mod grouping;
pub mod models;
pub mod payload;
pub mod preparation;
pub mod resolver;
pub mod submission;

pub use binding::{assigned_party, candidate_contacts, RecipientBindings};
pub use error::{BindingError, FilterStage, ResolutionError, SubmissionError, SubmissionPhase};
pub use flatten::flatten_recipients;
pub use grouping::group_recipients;
pub use models::{
    ActiveReference, Contact, ContactFields, GroupedRecipient, RecipientDefinition, ResolvedTemplate,
    SessionContext, Template, TemplateReference, Workflow, WorkflowResponsePayload, WorkflowUser,
};
pub use payload::assemble_payload;
pub use preparation::{prepare_workflow, PreparedWorkflow};
pub use resolver::{resolve_templates, select_active_references, TemplateResolution};
pub use submission::{extract_response_id, Submission, SubmissionState};
