//! Contact binding and readiness
//!
//! [`RecipientBindings`] owns the grouped recipient list. All mutation goes
//! through `&mut self`, which keeps binding serialised on multi-threaded hosts.

use log::{debug, info};

use super::error::BindingError;
use super::fallback;
use super::grouping::group_recipients;
use super::models::{Contact, FlatRecipient, GroupedRecipient, SessionContext};
use crate::api::stores::ContactStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipientBindings {
    recipients: Vec<GroupedRecipient>,
}

impl RecipientBindings {
    pub fn new(recipients: Vec<GroupedRecipient>) -> Self {
        Self { recipients }
    }

    pub fn from_flat(flat: &[FlatRecipient]) -> Self {
        Self::new(group_recipients(flat))
    }

    /// Replace every aggregate with a fresh grouping. Existing bindings are discarded.
    pub fn regroup(&mut self, flat: &[FlatRecipient]) {
        self.recipients = group_recipients(flat);
        debug!("Regrouped recipients into {} roles", self.recipients.len());
    }

    pub fn recipients(&self) -> &[GroupedRecipient] {
        &self.recipients
    }

    pub fn get(&self, role_key: &str) -> Option<&GroupedRecipient> {
        let key = fallback::normalize(role_key);
        self.recipients.iter().find(|r| r.role_key == key)
    }

    /// Copy `contact` onto the role's aggregate and record it as selected.
    pub fn bind(&mut self, role_key: &str, contact_id: &str, contact: &Contact) -> Result<(), BindingError> {
        let key = fallback::normalize(role_key);
        let recipient = self
            .recipients
            .iter_mut()
            .find(|r| r.role_key == key)
            .ok_or_else(|| BindingError::UnknownRole(role_key.to_string()))?;

        let incoming = &contact.fields;
        let fields = &mut recipient.recipient.contact;
        fields.email = incoming.email.clone();
        fields.first_name = incoming.first_name.clone();
        fields.last_name = incoming.last_name.clone();
        fields.phone = incoming.phone.clone();
        fields.address = incoming.address.clone();
        fields.title = incoming.title.clone();
        fields.company_name = incoming.company_name.clone();
        recipient.selected_contact_id = Some(contact_id.to_string());

        info!("Bound role '{}' to contact {}", recipient.role, contact_id);
        Ok(())
    }

    /// True when every non-sender role has an email and a selected contact.
    pub fn is_ready(&self) -> bool {
        self.recipients
            .iter()
            .all(|r| r.is_sender() || r.is_bound())
    }

    /// Display labels of the non-sender roles still missing a contact.
    pub fn incomplete_roles(&self) -> Vec<String> {
        self.recipients
            .iter()
            .filter(|r| !r.is_sender() && !r.is_bound())
            .map(|r| r.role.clone())
            .collect()
    }

    pub fn into_inner(self) -> Vec<GroupedRecipient> {
        self.recipients
    }
}

/// Who fills `recipient`: the session's user for the sender, otherwise the bound contact.
pub fn assigned_party<'a>(recipient: &'a GroupedRecipient, session: &'a SessionContext) -> Option<&'a str> {
    if recipient.is_sender() {
        fallback::first_non_blank([Some(session.user_id.as_str())])
    } else if recipient.is_bound() {
        fallback::bound_contact_id(recipient)
    } else {
        None
    }
}

/// Contacts that can fill `recipient`, narrowed by its contact type when it has one.
pub async fn candidate_contacts<S>(
    store: &S,
    session: &SessionContext,
    recipient: &GroupedRecipient,
) -> anyhow::Result<Vec<Contact>>
where
    S: ContactStore + ?Sized,
{
    let contacts = store
        .list_contacts(&session.company_id, recipient.contact_type_filter())
        .await?;
    debug!("{} candidate contacts for role '{}'", contacts.len(), recipient.role);
    Ok(contacts)
}
