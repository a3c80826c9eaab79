//! Ordered-fallback accessors
//!
//! The API is loose about where a value lives, so several fields are read as
//! "first usable of A, B, C". Each chain is defined once here:
//!
//! | accessor                  | precedence                                             |
//! |---------------------------|--------------------------------------------------------|
//! | [`record_id`]             | `_id` → `id`                                           |
//! | [`role_label`]            | `contact_type_name` → `role` → `contact_type`          |
//! | [`reference_template_id`] | nested `template_id._id`/`.id` → bare `template_id` → reference `_id`/`id` |
//! | [`bound_contact_id`]      | `selected_contact_id` → `contact_id`                   |
//!
//! Blank strings count as absent in every chain.

use super::models::{GroupedRecipient, RecipientDefinition, TemplateHandle, TemplateReference};

/// Role key shared by every sender-side recipient
pub const SENDER_ROLE_KEY: &str = "sender";

/// `type` value marking the sending party
pub const SENDER_TYPE: &str = "SENDER";

/// First candidate that is present and not blank.
pub fn first_non_blank<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
}

pub fn record_id<'a>(object_id: Option<&'a str>, id: Option<&'a str>) -> Option<&'a str> {
    first_non_blank([object_id, id])
}

/// Human-readable label for a recipient's role.
pub fn role_label(recipient: &RecipientDefinition) -> Option<&str> {
    first_non_blank([
        recipient.contact_type_name.as_deref(),
        recipient.role.as_deref(),
        recipient.contact_type.as_deref(),
    ])
}

/// Whether a recipient is the sending party.
///
/// This is the only place that decides it: either the definition is typed
/// `SENDER` or its role label normalises to `sender`.
pub fn is_sender(recipient: &RecipientDefinition) -> bool {
    let typed_sender = recipient
        .kind
        .as_deref()
        .is_some_and(|kind| kind.trim().eq_ignore_ascii_case(SENDER_TYPE));
    typed_sender || normalize(role_label(recipient).unwrap_or_default()) == SENDER_ROLE_KEY
}

/// Identity used to merge recipients across templates.
///
/// Senders always share [`SENDER_ROLE_KEY`] so a `SENDER`-typed slot can never
/// collapse into a receiver role that happens to carry the same label.
pub fn role_key(recipient: &RecipientDefinition) -> String {
    if is_sender(recipient) {
        return SENDER_ROLE_KEY.to_string();
    }
    normalize(role_label(recipient).unwrap_or_default())
}

pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// The template id a reference points at.
pub fn reference_template_id(reference: &TemplateReference) -> Option<&str> {
    let nested = reference
        .template_id
        .as_ref()
        .and_then(TemplateHandle::nested)
        .and_then(|nested| record_id(nested.object_id.as_deref(), nested.id.as_deref()));
    let bare = match &reference.template_id {
        Some(TemplateHandle::Id(id)) => Some(id.as_str()),
        _ => None,
    };
    let own = record_id(reference.object_id.as_deref(), reference.id.as_deref());

    first_non_blank([nested, bare, own])
}

pub fn bound_contact_id(recipient: &GroupedRecipient) -> Option<&str> {
    first_non_blank([
        recipient.selected_contact_id.as_deref(),
        recipient.recipient.contact_id.as_deref(),
    ])
}
