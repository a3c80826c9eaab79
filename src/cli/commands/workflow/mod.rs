use clap::{Args, Subcommand};

pub mod handler;

pub use handler::workflow_command;

#[derive(Args)]
pub struct WorkflowCommands {
    #[command(subcommand)]
    pub command: WorkflowSubcommands,
}

#[derive(Subcommand)]
pub enum WorkflowSubcommands {
    /// Show a workflow's live templates and the roles they need
    Show {
        workflow_id: String,
    },
    /// List the contacts that can fill each role
    Contacts {
        workflow_id: String,
        /// Only this role
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Bind contacts to roles and send the workflow
    Send {
        workflow_id: String,
        /// Bind a role to a contact id, e.g. --bind buyer=64f1c0
        #[arg(short, long = "bind", value_name = "ROLE=CONTACT_ID", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
        /// Print the payload instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Send without confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Send a workflow response that was created but never sent
    Resend {
        workflow_id: String,
        response_id: String,
    },
}

/// Parse `role=contact_id`.
pub fn parse_binding(raw: &str) -> Result<(String, String), String> {
    let (role, contact_id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=CONTACT_ID, got '{}'", raw))?;

    let (role, contact_id) = (role.trim(), contact_id.trim());
    if role.is_empty() || contact_id.is_empty() {
        return Err(format!("expected ROLE=CONTACT_ID, got '{}'", raw));
    }
    Ok((role.to_string(), contact_id.to_string()))
}
