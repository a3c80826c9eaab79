//! Flattens resolved templates into one recipient list

use uuid::Uuid;

use super::models::{FlatRecipient, ResolvedTemplate};

/// Every recipient of every template, in template order then recipient order.
pub fn flatten_recipients(templates: &[ResolvedTemplate]) -> Vec<FlatRecipient> {
    templates
        .iter()
        .flat_map(|template| {
            let template_id = template.id().to_string();
            let template_name = template.name().map(str::to_string);

            template
                .template
                .document_users
                .iter()
                .map(move |definition| FlatRecipient {
                    key: Uuid::new_v4(),
                    template_id: Some(template_id.clone()),
                    template_name: template_name.clone(),
                    definition: definition.clone(),
                })
        })
        .collect()
}
