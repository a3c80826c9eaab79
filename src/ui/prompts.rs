use anyhow::Result;
use dialoguer::{Input, Password, Select};

use crate::config::EnvironmentConfig;
use crate::workflow::models::Contact;

/// Arrow-key Yes/No prompt. `Ok(true)` when "Yes" is chosen.
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_overwrite_confirmation(env_name: &str) -> Result<bool> {
    prompt_confirmation(
        &format!("Environment '{}' already exists. Overwrite?", env_name),
        false,
    )
}

pub fn prompt_remove_confirmation(env_name: &str) -> Result<bool> {
    prompt_confirmation(&format!("Remove environment '{}'?", env_name), false)
}

pub fn prompt_send_confirmation(workflow_name: &str, recipients: usize) -> Result<bool> {
    prompt_confirmation(
        &format!("Send '{}' to {} recipient(s)?", workflow_name, recipients),
        false,
    )
}

pub fn prompt_environment_name(default_name: Option<String>) -> Result<String> {
    match default_name {
        Some(name) => Ok(name),
        None => Ok(Input::<String>::new()
            .with_prompt("Environment name (e.g., 'production', 'sandbox')")
            .interact()?),
    }
}

/// Fill whichever environment fields were not given on the command line.
pub fn prompt_environment(
    host: Option<String>,
    api_token: Option<String>,
    company_id: Option<String>,
    user_id: Option<String>,
) -> Result<EnvironmentConfig> {
    let host = match host {
        Some(h) => h,
        None => Input::<String>::new()
            .with_prompt("E-signature API host (e.g., https://sign.example.com)")
            .interact()?,
    };

    let api_token = match api_token {
        Some(t) => t,
        None => Password::new().with_prompt("API token").interact()?,
    };

    let company_id = match company_id {
        Some(c) => c,
        None => Input::<String>::new().with_prompt("Company ID").interact()?,
    };

    let user_id = match user_id {
        Some(u) => u,
        None => Input::<String>::new().with_prompt("User ID").interact()?,
    };

    Ok(EnvironmentConfig {
        host,
        api_token,
        company_id,
        user_id,
    })
}

pub fn prompt_environment_selection(env_names: &[&str], current_env: Option<&str>) -> Result<String> {
    let items: Vec<String> = env_names
        .iter()
        .map(|env| {
            if current_env == Some(*env) {
                format!("{} (current)", env)
            } else {
                env.to_string()
            }
        })
        .collect();

    let selection = Select::new()
        .with_prompt("Select environment")
        .items(&items)
        .interact()?;

    Ok(env_names[selection].to_string())
}

/// One line per contact: name, email, type.
pub fn contact_label(contact: &Contact) -> String {
    let name = contact.fields.full_name();
    let name = if name.is_empty() { "(no name)".to_string() } else { name };
    let email = contact.fields.email.as_deref().unwrap_or("no email");

    match contact.contact_type.as_deref() {
        Some(kind) => format!("{} <{}> [{}]", name, email, kind),
        None => format!("{} <{}>", name, email),
    }
}

/// Pick a contact for `role`. `Ok(None)` when the user skips.
pub fn prompt_contact_selection<'a>(role: &str, contacts: &'a [Contact]) -> Result<Option<&'a Contact>> {
    let mut items: Vec<String> = contacts.iter().map(contact_label).collect();
    items.push("Skip".to_string());

    let selection = Select::new()
        .with_prompt(format!("Contact for '{}'", role))
        .items(&items)
        .default(0)
        .interact()?;

    Ok(contacts.get(selection))
}
