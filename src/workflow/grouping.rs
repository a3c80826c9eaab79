//! Recipient grouping
//!
//! Folds the flat recipient list into one aggregate per role key. The first
//! recipient seen for a key provides the display fields; later ones only add
//! their template to the aggregate's membership list.

use std::collections::HashMap;

use super::fallback;
use super::models::{FlatRecipient, GroupedRecipient, TemplateMembership};

/// One [`GroupedRecipient`] per distinct role key, in first-seen order.
pub fn group_recipients(flat: &[FlatRecipient]) -> Vec<GroupedRecipient> {
    let mut grouped: Vec<GroupedRecipient> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for recipient in flat {
        let key = fallback::role_key(&recipient.definition);

        match index_by_key.get(&key) {
            Some(&index) => merge_into(&mut grouped[index], recipient),
            None => {
                index_by_key.insert(key.clone(), grouped.len());
                grouped.push(new_group(key, recipient));
            }
        }
    }

    grouped
}

fn new_group(role_key: String, recipient: &FlatRecipient) -> GroupedRecipient {
    let role = fallback::role_label(&recipient.definition)
        .unwrap_or_default()
        .to_string();

    GroupedRecipient {
        role_key,
        role,
        recipient: recipient.definition.clone(),
        selected_contact_id: None,
        templates: vec![membership(recipient)],
        template_names: recipient.template_name.iter().cloned().collect(),
    }
}

fn merge_into(group: &mut GroupedRecipient, recipient: &FlatRecipient) {
    let already_member = group
        .templates
        .iter()
        .any(|entry| entry.template_id == recipient.template_id);
    if !already_member {
        group.templates.push(membership(recipient));
    }

    if let Some(name) = recipient.template_name.as_deref() {
        if !group.template_names.iter().any(|existing| existing == name) {
            group.template_names.push(name.to_string());
        }
    }
}

fn membership(recipient: &FlatRecipient) -> TemplateMembership {
    TemplateMembership {
        template_id: recipient.template_id.clone(),
        template_name: recipient.template_name.clone(),
        user_type: recipient.definition.user_type.clone(),
    }
}
