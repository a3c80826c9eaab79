use super::commands::env::EnvCommands;
use super::commands::workflow::WorkflowCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "esign-cli")]
#[command(about = "Prepare and send e-signature workflows from the command line")]
#[command(version)]
pub struct Cli {
    /// Use this environment instead of the current one
    #[arg(long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage API environments
    Env(EnvCommands),
    /// Inspect, bind and send workflows
    Workflow(WorkflowCommands),
}
