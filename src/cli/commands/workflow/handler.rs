//! Workflow command handlers

use anyhow::{Context, Result};
use colored::*;
use is_terminal::IsTerminal;
use log::{info, warn};

use super::{WorkflowCommands, WorkflowSubcommands};
use crate::api::{ClientManager, Connection};
use crate::ui::{contact_label, prompt_contact_selection, prompt_send_confirmation};
use crate::workflow::{
    assigned_party, candidate_contacts, prepare_workflow, BindingError, GroupedRecipient, PreparedWorkflow,
    SessionContext, Submission, SubmissionState,
};

pub async fn workflow_command(cmd: WorkflowCommands, env: Option<&str>) -> Result<()> {
    let manager = ClientManager::load()?;
    let connection = match env {
        Some(name) => manager.get_client_for(name)?,
        None => manager.get_client()?,
    };

    match cmd.command {
        WorkflowSubcommands::Show { workflow_id } => show_command(&connection, &workflow_id).await,
        WorkflowSubcommands::Contacts { workflow_id, role } => {
            contacts_command(&connection, &workflow_id, role.as_deref()).await
        }
        WorkflowSubcommands::Send {
            workflow_id,
            bindings,
            dry_run,
            yes,
        } => send_command(&connection, &workflow_id, &bindings, dry_run, yes).await,
        WorkflowSubcommands::Resend {
            workflow_id,
            response_id,
        } => resend_command(&connection, &workflow_id, &response_id).await,
    }
}

async fn prepare(connection: &Connection, workflow_id: &str) -> Result<PreparedWorkflow> {
    println!("🔄 {}", format!("Loading workflow {}...", workflow_id).dimmed());
    let client = &connection.client;
    prepare_workflow(client, client, &connection.session, workflow_id).await
}

fn workflow_title(prepared: &PreparedWorkflow) -> &str {
    prepared
        .workflow
        .name
        .as_deref()
        .unwrap_or(prepared.workflow_id.as_str())
}

async fn show_command(connection: &Connection, workflow_id: &str) -> Result<()> {
    let prepared = prepare(connection, workflow_id).await?;

    println!();
    println!("📋 {} ({})", workflow_title(&prepared).bright_white().bold(), workflow_id.dimmed());
    if prepared.workflow.enforce_signature_order {
        println!("   {}", "Signature order is enforced".bright_yellow());
    }

    println!();
    println!("  {}", "Templates:".bright_white().bold());
    for template in &prepared.templates {
        println!(
            "  {} {} ({})",
            "✓".bright_green(),
            template.name().unwrap_or("(untitled)"),
            template.id().dimmed()
        );
    }
    for skipped in &prepared.skipped {
        println!("  {} {}", "✗".bright_red(), skipped.to_string().dimmed());
    }
    if prepared.templates.is_empty() && prepared.skipped.is_empty() {
        println!("  {}", "No templates".dimmed());
    }

    println!();
    println!("  {}", "Roles:".bright_white().bold());
    for recipient in prepared.bindings.recipients() {
        print_role(recipient, &prepared.session);
    }
    if prepared.bindings.recipients().is_empty() {
        println!("  {}", "No recipients".dimmed());
    }
    println!();

    Ok(())
}

fn print_role(recipient: &GroupedRecipient, session: &SessionContext) {
    let status = if recipient.is_sender() {
        "sender".cyan()
    } else if recipient.is_bound() {
        "bound".bright_green()
    } else {
        "unbound".bright_yellow()
    };

    println!(
        "  {} {} [{}] → {}",
        "●".bright_green(),
        recipient.role.bright_white().bold(),
        status,
        recipient.involved_templates()
    );
    if recipient.is_sender() {
        if let Some(user_id) = assigned_party(recipient, session) {
            println!("      {}", format!("signed by you ({})", user_id).dimmed());
        }
    } else if let Some(email) = recipient.contact().email.as_deref() {
        println!("      {}", email.dimmed());
    }
}

async fn contacts_command(connection: &Connection, workflow_id: &str, role: Option<&str>) -> Result<()> {
    let prepared = prepare(connection, workflow_id).await?;

    let recipients: Vec<&GroupedRecipient> = match role {
        Some(role) => vec![prepared
            .bindings
            .get(role)
            .ok_or_else(|| BindingError::UnknownRole(role.to_string()))?],
        None => prepared
            .bindings
            .recipients()
            .iter()
            .filter(|r| !r.is_sender())
            .collect(),
    };

    for recipient in recipients {
        let contacts = candidate_contacts(&connection.client, &connection.session, recipient)
            .await
            .with_context(|| format!("Failed to list contacts for '{}'", recipient.role))?;

        println!();
        println!(
            "  {} ({} contacts)",
            recipient.role.bright_white().bold(),
            contacts.len()
        );
        for contact in &contacts {
            println!(
                "    {} {}",
                contact.id().unwrap_or("-").cyan(),
                contact_label(contact)
            );
        }
    }
    println!();

    Ok(())
}

/// Bind `role` to the contact with `contact_id` from the role's candidate list.
async fn bind_by_id(
    connection: &Connection,
    prepared: &mut PreparedWorkflow,
    role: &str,
    contact_id: &str,
) -> Result<()> {
    let recipient = prepared
        .bindings
        .get(role)
        .ok_or_else(|| BindingError::UnknownRole(role.to_string()))?;

    let contacts = candidate_contacts(&connection.client, &connection.session, recipient).await?;
    let contact = contacts
        .iter()
        .find(|c| c.id() == Some(contact_id))
        .with_context(|| format!("Contact {} cannot fill role '{}'", contact_id, recipient.role))?;

    prepared.bindings.bind(role, contact_id, contact)?;
    Ok(())
}

/// Prompt for every role that is still unbound.
async fn bind_interactively(connection: &Connection, prepared: &mut PreparedWorkflow) -> Result<()> {
    let pending: Vec<GroupedRecipient> = prepared
        .bindings
        .recipients()
        .iter()
        .filter(|r| !r.is_sender() && !r.is_bound())
        .cloned()
        .collect();

    for recipient in pending {
        let contacts = candidate_contacts(&connection.client, &connection.session, &recipient).await?;
        if contacts.is_empty() {
            println!("  {} No contacts available for '{}'", "⚠️".bright_yellow(), recipient.role);
            continue;
        }

        let Some(contact) = prompt_contact_selection(&recipient.role, &contacts)? else {
            continue;
        };
        match contact.id() {
            Some(contact_id) => prepared.bindings.bind(&recipient.role_key, contact_id, contact)?,
            None => warn!("Selected contact for '{}' has no id, skipping", recipient.role),
        }
    }
    Ok(())
}

async fn send_command(
    connection: &Connection,
    workflow_id: &str,
    bindings: &[(String, String)],
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let mut prepared = prepare(connection, workflow_id).await?;
    let interactive = std::io::stdin().is_terminal();

    for (role, contact_id) in bindings {
        bind_by_id(connection, &mut prepared, role, contact_id).await?;
        println!("{} Bound '{}' to {}", "✓".bright_green().bold(), role, contact_id.cyan());
    }

    if !prepared.bindings.is_ready() && interactive {
        bind_interactively(connection, &mut prepared).await?;
    }

    let payload = prepared.payload();
    if dry_run {
        println!("🔍 Payload:");
        println!("{}", serde_json::to_string_pretty(&payload)?);
        let missing = prepared.bindings.incomplete_roles();
        if !missing.is_empty() {
            println!("{} Unbound roles: {}", "⚠".bright_yellow().bold(), missing.join(", "));
        }
        return Ok(());
    }

    if !yes {
        if !interactive {
            anyhow::bail!("Refusing to send without confirmation; pass --yes");
        }
        if !prompt_send_confirmation(workflow_title(&prepared), payload.workflow_users.len())? {
            println!("Send cancelled.");
            return Ok(());
        }
    }

    info!("Submitting workflow {}", workflow_id);
    let mut submission = Submission::new(&connection.client, workflow_id);
    match submission.submit(&prepared.bindings, &payload).await {
        Ok(response_id) => {
            println!(
                "{} Sent workflow response {}",
                "✓".bright_green().bold(),
                response_id.bright_green().bold()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "❌".bright_red().bold(), e.to_string().bright_red());
            if let SubmissionState::Failed {
                response_id: Some(response_id),
                ..
            } = submission.state()
            {
                println!(
                    "   Response {} was created but not sent. Retry with: esign-cli workflow resend {} {}",
                    response_id.cyan(),
                    workflow_id,
                    response_id
                );
            }
            Err(e.into())
        }
    }
}

async fn resend_command(connection: &Connection, workflow_id: &str, response_id: &str) -> Result<()> {
    let mut submission = Submission::resume(&connection.client, workflow_id, response_id);
    let response_id = submission.retry_send().await?;
    println!(
        "{} Sent workflow response {}",
        "✓".bright_green().bold(),
        response_id.bright_green().bold()
    );
    Ok(())
}
