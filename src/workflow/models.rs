//! Wire and in-memory types for workflow recipient aggregation
//!
//! Records coming from the e-signature API are parsed leniently: every field is
//! optional, ids may arrive as `_id` or `id`, and references to other records
//! may be a bare id or a populated object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::fallback;

/// Completion status assigned to templates that have never been started
pub const DEFAULT_COMPLETION_STATUS: &str = "TO-START";

/// The only status value that counts as live
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Caller identity threaded explicitly through every component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub company_id: String,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, company_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: company_id.into(),
        }
    }
}

/// Liveness markers carried by references, nested templates and fetched templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveFlags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ActiveFlags {
    /// Absent markers pass; an explicit `false` or a non-`ACTIVE` status fails.
    pub fn passes(&self) -> bool {
        let flag_ok = self.is_active != Some(false);
        let status_ok = self
            .status
            .as_deref()
            .map_or(true, |status| status.trim().eq_ignore_ascii_case(ACTIVE_STATUS));
        flag_ok && status_ok
    }
}

/// Accepts a string, a number, or an object carrying `_id`/`id`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            let object_id = map.get("_id").and_then(id_from_value);
            object_id.or_else(|| map.get("id").and_then(id_from_value))
        }
        _ => None,
    }
}

/// Accepts a string or a number; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Reads `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts an integer, an integral float, or a numeric string; anything else reads as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Contact details that start empty on a recipient and are filled by binding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
}

impl ContactFields {
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|email| !email.trim().is_empty())
    }

    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// A contact owned by the contact store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: ContactFields,
    #[serde(default, deserialize_with = "lenient_id")]
    pub contact_type: Option<String>,
}

impl Contact {
    pub fn id(&self) -> Option<&str> {
        fallback::record_id(self.object_id.as_deref(), self.id.as_deref())
    }
}

/// One recipient slot as defined inside a single template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipientDefinition {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub contact_type_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub contact_type: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub e_signature_required: bool,
    #[serde(default, deserialize_with = "lenient_int")]
    pub e_signature_order: Option<i64>,
    #[serde(flatten)]
    pub contact: ContactFields,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub contact_id: Option<String>,
}

/// A template as returned by the template store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub flags: ActiveFlags,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_users: Vec<RecipientDefinition>,
}

impl Template {
    pub fn id(&self) -> Option<&str> {
        fallback::record_id(self.object_id.as_deref(), self.id.as_deref())
    }

    pub fn display_name(&self) -> Option<&str> {
        fallback::first_non_blank([self.title.as_deref(), self.name.as_deref()])
    }
}

/// The summary of a template embedded in a workflow's reference list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedTemplate {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub flags: ActiveFlags,
}

/// `template_id` on a reference: bare id, populated object, or something unusable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateHandle {
    Id(String),
    Nested(NestedTemplate),
    Unrecognized(Value),
}

impl TemplateHandle {
    pub fn nested(&self) -> Option<&NestedTemplate> {
        match self {
            TemplateHandle::Nested(nested) => Some(nested),
            _ => None,
        }
    }
}

/// A workflow's pointer to a template plus its per-workflow scheduling state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateReference {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub template_id: Option<TemplateHandle>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub template_response_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub document_order: Option<i64>,
    #[serde(default)]
    pub template_completion_status: Option<String>,
    #[serde(default)]
    pub is_settings_updated: Option<bool>,
    #[serde(flatten)]
    pub flags: ActiveFlags,
}

/// A workflow as returned by the workflow store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub templates: Vec<TemplateReference>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_templates: Vec<TemplateReference>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enforce_signature_order: bool,
}

impl Workflow {
    pub fn id(&self) -> Option<&str> {
        fallback::record_id(self.object_id.as_deref(), self.id.as_deref())
    }

    /// `templates`, or `document_templates` when the former is empty.
    pub fn template_references(&self) -> &[TemplateReference] {
        if self.templates.is_empty() {
            &self.document_templates
        } else {
            &self.templates
        }
    }
}

/// A reference that passed the reference-level active filter
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveReference {
    /// Index in the workflow's reference list
    pub position: usize,
    pub template_id: String,
    pub reference: TemplateReference,
}

/// A fetched template that passed every liveness check
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub source: ActiveReference,
    pub template: Template,
}

impl ResolvedTemplate {
    /// The fetched record's id, falling back to the id the reference pointed at.
    pub fn id(&self) -> &str {
        self.template.id().unwrap_or(&self.source.template_id)
    }

    pub fn name(&self) -> Option<&str> {
        self.template.display_name().or_else(|| {
            self.source
                .reference
                .template_id
                .as_ref()
                .and_then(TemplateHandle::nested)
                .and_then(|nested| nested.title.as_deref())
        })
    }
}

/// A recipient definition tagged with the template it came from
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecipient {
    /// Synthetic identity for list rendering only
    pub key: Uuid,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub definition: RecipientDefinition,
}

/// One template a grouped role participates in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMembership {
    pub template_id: Option<String>,
    pub template_name: Option<String>,
    pub user_type: Option<String>,
}

/// All recipients sharing one role key, across every template
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRecipient {
    pub role_key: String,
    /// Display label
    pub role: String,
    /// First-seen definition; its contact fields are overwritten by binding
    pub recipient: RecipientDefinition,
    pub selected_contact_id: Option<String>,
    pub templates: Vec<TemplateMembership>,
    /// Distinct template names, in first-seen order
    pub template_names: Vec<String>,
}

impl GroupedRecipient {
    pub fn is_sender(&self) -> bool {
        fallback::is_sender(&self.recipient)
    }

    pub fn contact(&self) -> &ContactFields {
        &self.recipient.contact
    }

    /// Bound when it has an email and a selected contact.
    pub fn is_bound(&self) -> bool {
        self.recipient.contact.has_email() && self.selected_contact_id.is_some()
    }

    /// Template names joined for display.
    pub fn involved_templates(&self) -> String {
        self.template_names.join(", ")
    }

    /// Contact type used to narrow the contacts offered for this role.
    pub fn contact_type_filter(&self) -> Option<&str> {
        self.recipient.contact_type.as_deref()
    }
}

/// One entry of the `document_templates` array sent on create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTemplateEntry {
    pub template_id: String,
    pub template_response_id: Option<String>,
    pub document_order: i64,
    pub template_completion_status: String,
    pub is_settings_updated: bool,
}

/// Wire-level recipient record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowUser {
    #[serde(flatten)]
    pub contact: ContactFields,
    pub role: String,
    pub templates: Vec<TemplateMembership>,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_type: String,
    pub contact_id: Option<String>,
    pub full_name: String,
}

/// Body of the create-workflow-response call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResponsePayload {
    pub company_id: String,
    pub document_templates: Vec<DocumentTemplateEntry>,
    pub workflow_users: Vec<WorkflowUser>,
    pub primary_user: Option<WorkflowUser>,
    pub enforce_signature_order: bool,
}
