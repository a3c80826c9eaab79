//! Loads a workflow and runs it through resolution, flattening and grouping

use anyhow::{Context, Result};
use log::{info, warn};

use super::binding::{assigned_party, RecipientBindings};
use super::error::ResolutionError;
use super::flatten::flatten_recipients;
use super::models::{ActiveReference, ResolvedTemplate, SessionContext, Workflow, WorkflowResponsePayload};
use super::payload::assemble_payload;
use super::resolver::{resolve_templates, select_active_references};
use crate::api::stores::{TemplateStore, WorkflowStore};

/// Everything the send screen works with for one workflow
#[derive(Debug, Clone)]
pub struct PreparedWorkflow {
    pub workflow_id: String,
    pub workflow: Workflow,
    pub session: SessionContext,
    /// References that passed the reference-level filter, in workflow order
    pub references: Vec<ActiveReference>,
    pub templates: Vec<ResolvedTemplate>,
    /// Every reference or template that was left out, and why
    pub skipped: Vec<ResolutionError>,
    pub bindings: RecipientBindings,
}

impl PreparedWorkflow {
    /// Fresh payload from the current binding state.
    pub fn payload(&self) -> WorkflowResponsePayload {
        assemble_payload(
            &self.session,
            &self.references,
            self.bindings.recipients(),
            self.workflow.enforce_signature_order,
        )
    }

    /// Re-fetch the templates and rebuild every role from scratch.
    pub async fn reload_templates<T>(&mut self, templates: &T)
    where
        T: TemplateStore + ?Sized,
    {
        let selection = select_active_references(self.workflow.template_references());
        let resolution = resolve_templates(templates, &self.session, &selection.active).await;

        self.bindings.regroup(&flatten_recipients(&resolution.resolved));
        self.references = selection.active;
        self.templates = resolution.resolved;
        self.skipped = selection.skipped;
        self.skipped.extend(resolution.skipped);
        self.skipped.sort_by_key(ResolutionError::position);
    }
}

pub async fn prepare_workflow<W, T>(
    workflows: &W,
    templates: &T,
    session: &SessionContext,
    workflow_id: &str,
) -> Result<PreparedWorkflow>
where
    W: WorkflowStore + ?Sized,
    T: TemplateStore + ?Sized,
{
    let workflow = workflows
        .get_workflow(workflow_id)
        .await
        .with_context(|| format!("Failed to load workflow {}", workflow_id))?;

    info!(
        "Preparing workflow {} ({} template references)",
        workflow_id,
        workflow.template_references().len()
    );

    let mut prepared = PreparedWorkflow {
        workflow_id: workflow_id.to_string(),
        workflow,
        session: session.clone(),
        references: Vec::new(),
        templates: Vec::new(),
        skipped: Vec::new(),
        bindings: RecipientBindings::default(),
    };
    prepared.reload_templates(templates).await;

    for sender in prepared.bindings.recipients().iter().filter(|r| r.is_sender()) {
        match assigned_party(sender, session) {
            Some(user_id) => info!("Role '{}' is filled by the current user {}", sender.role, user_id),
            None => warn!("Role '{}' needs the current user but the session has no user id", sender.role),
        }
    }

    info!(
        "Workflow {} has {} roles across {} templates",
        workflow_id,
        prepared.bindings.recipients().len(),
        prepared.templates.len()
    );
    Ok(prepared)
}
