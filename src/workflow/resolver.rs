//! Template resolution
//!
//! Turns a workflow's reference list into fetched, live templates. References
//! are filtered first, then every survivor is fetched concurrently and the
//! results are joined in reference order. A failing reference only removes
//! itself; the batch always completes.

use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;

use super::error::{FilterStage, ResolutionError};
use super::fallback;
use super::models::{ActiveReference, ResolvedTemplate, SessionContext, Template, TemplateHandle, TemplateReference};
use crate::api::envelope;
use crate::api::stores::TemplateStore;

/// References that passed the reference-level filter, plus the ones that did not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSelection {
    pub active: Vec<ActiveReference>,
    pub skipped: Vec<ResolutionError>,
}

/// Outcome of fetching the active references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateResolution {
    pub resolved: Vec<ResolvedTemplate>,
    pub skipped: Vec<ResolutionError>,
}

/// Apply the active filter and extract a template id from every reference.
pub fn select_active_references(references: &[TemplateReference]) -> ReferenceSelection {
    let mut selection = ReferenceSelection::default();

    for (position, reference) in references.iter().enumerate() {
        match check_reference(position, reference) {
            Ok(active) => selection.active.push(active),
            Err(reason) => {
                warn!("Skipping template reference: {}", reason);
                selection.skipped.push(reason);
            }
        }
    }

    debug!(
        "Selected {} of {} template references",
        selection.active.len(),
        references.len()
    );
    selection
}

fn check_reference(position: usize, reference: &TemplateReference) -> Result<ActiveReference, ResolutionError> {
    let template_id = fallback::reference_template_id(reference).map(str::to_string);

    if !reference.flags.passes() {
        return Err(ResolutionError::Inactive {
            position,
            template_id,
            stage: FilterStage::Reference,
        });
    }

    let nested_passes = reference
        .template_id
        .as_ref()
        .and_then(TemplateHandle::nested)
        .map_or(true, |nested| nested.flags.passes());
    if !nested_passes {
        return Err(ResolutionError::Inactive {
            position,
            template_id,
            stage: FilterStage::NestedTemplate,
        });
    }

    let template_id = template_id.ok_or(ResolutionError::MissingTemplateId { position })?;

    Ok(ActiveReference {
        position,
        template_id,
        reference: reference.clone(),
    })
}

/// Fetch every active reference concurrently and keep the ones that resolve.
///
/// Output order follows `active`, whatever order the fetches complete in.
pub async fn resolve_templates<S>(
    store: &S,
    session: &SessionContext,
    active: &[ActiveReference],
) -> TemplateResolution
where
    S: TemplateStore + ?Sized,
{
    info!("Fetching {} templates for company {}", active.len(), session.company_id);

    let outcomes = join_all(active.iter().map(|reference| fetch_template(store, session, reference))).await;

    let mut resolution = TemplateResolution::default();
    for outcome in outcomes {
        match outcome {
            Ok(resolved) => resolution.resolved.push(resolved),
            Err(reason) => {
                warn!("Dropping template: {}", reason);
                resolution.skipped.push(reason);
            }
        }
    }

    info!(
        "Resolved {} templates ({} dropped)",
        resolution.resolved.len(),
        resolution.skipped.len()
    );
    resolution
}

async fn fetch_template<S>(
    store: &S,
    session: &SessionContext,
    source: &ActiveReference,
) -> Result<ResolvedTemplate, ResolutionError>
where
    S: TemplateStore + ?Sized,
{
    let position = source.position;
    let template_id = source.template_id.clone();

    let raw = store
        .get_template(&template_id, &session.company_id)
        .await
        .map_err(|e| ResolutionError::Fetch {
            position,
            template_id: template_id.clone(),
            message: format!("{:#}", e),
        })?;

    let template = parse_template(&raw).map_err(|message| ResolutionError::MalformedEnvelope {
        position,
        template_id: template_id.clone(),
        message,
    })?;

    // The reference can be stale, so the fetched record gets its own check
    if !template.flags.passes() {
        return Err(ResolutionError::Inactive {
            position,
            template_id: Some(template_id),
            stage: FilterStage::Fetched,
        });
    }

    debug!(
        "Template {} resolved with {} recipients",
        template_id,
        template.document_users.len()
    );

    Ok(ResolvedTemplate {
        source: source.clone(),
        template,
    })
}

fn parse_template(raw: &Value) -> Result<Template, String> {
    let record = envelope::first_object(raw, envelope::RECORD_PATHS)
        .ok_or_else(|| "response contains no template object".to_string())?;

    serde_json::from_value(Value::Object(record.clone()))
        .map_err(|e| format!("unexpected template shape: {}", e))
}
