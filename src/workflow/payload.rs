//! Payload assembly for the create-workflow-response call
//!
//! Pure functions of the aggregate state and the active references. Nothing
//! here reads the clock or generates ids, so assembling twice from the same
//! state yields identical payloads and a retried submission sends the same body.

use super::fallback;
use super::models::{
    ActiveReference, DocumentTemplateEntry, GroupedRecipient, SessionContext, WorkflowResponsePayload,
    WorkflowUser, DEFAULT_COMPLETION_STATUS,
};

pub const DEFAULT_RECIPIENT_TYPE: &str = "RECEIVER";
pub const DEFAULT_USER_TYPE: &str = "SIGNER";

pub fn assemble_payload(
    session: &SessionContext,
    references: &[ActiveReference],
    recipients: &[GroupedRecipient],
    enforce_signature_order: bool,
) -> WorkflowResponsePayload {
    let workflow_users = workflow_users(recipients);
    let primary_user = workflow_users.first().cloned();

    WorkflowResponsePayload {
        company_id: session.company_id.clone(),
        document_templates: document_templates(references),
        workflow_users,
        primary_user,
        enforce_signature_order,
    }
}

pub fn document_templates(references: &[ActiveReference]) -> Vec<DocumentTemplateEntry> {
    references
        .iter()
        .map(|active| {
            let reference = &active.reference;
            DocumentTemplateEntry {
                template_id: active.template_id.clone(),
                template_response_id: reference.template_response_id.clone(),
                document_order: reference.document_order.unwrap_or(0),
                template_completion_status: reference
                    .template_completion_status
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMPLETION_STATUS.to_string()),
                is_settings_updated: reference.is_settings_updated.unwrap_or(false),
            }
        })
        .collect()
}

/// Non-sender roles that are attached to at least one identified template.
pub fn workflow_users(recipients: &[GroupedRecipient]) -> Vec<WorkflowUser> {
    let mut users = Vec::new();

    for recipient in recipients.iter().filter(|r| !r.is_sender()) {
        let templates: Vec<_> = recipient
            .templates
            .iter()
            .filter(|entry| entry.template_id.is_some())
            .cloned()
            .collect();

        // Without a template the server would create an orphaned recipient
        if templates.is_empty() {
            continue;
        }

        let definition = &recipient.recipient;
        let position = users.len() + 1;

        users.push(WorkflowUser {
            contact: definition.contact.clone(),
            role: recipient.role.clone(),
            templates,
            value: fallback::first_non_blank([definition.value.as_deref()])
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}_{}", DEFAULT_RECIPIENT_TYPE, position)),
            kind: fallback::first_non_blank([definition.kind.as_deref()])
                .unwrap_or(DEFAULT_RECIPIENT_TYPE)
                .to_string(),
            user_type: fallback::first_non_blank([definition.user_type.as_deref()])
                .unwrap_or(DEFAULT_USER_TYPE)
                .to_string(),
            contact_id: fallback::bound_contact_id(recipient).map(str::to_string),
            full_name: definition.contact.full_name(),
        });
    }

    users
}
