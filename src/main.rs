use anyhow::Result;
use clap::Parser;
use log::info;

use esign_cli::cli::commands::{env_command, workflow_command};
use esign_cli::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to file, truncated on each run
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("esign-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting esign-cli");

    match cli.command {
        Commands::Env(cmd) => env_command(cmd).await,
        Commands::Workflow(cmd) => workflow_command(cmd, cli.env.as_deref()).await,
    }
}
