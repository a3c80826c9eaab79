//! Environment management

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::info;

use crate::config::Config;
use crate::ui::{
    prompt_environment, prompt_environment_name, prompt_environment_selection, prompt_overwrite_confirmation,
    prompt_remove_confirmation,
};

#[derive(Args)]
pub struct EnvCommands {
    #[command(subcommand)]
    pub command: EnvSubcommands,
}

#[derive(Subcommand)]
pub enum EnvSubcommands {
    /// Add or replace an environment
    Add {
        /// Name for this environment (e.g., "production", "sandbox")
        #[arg(short, long)]
        name: Option<String>,
        /// API host URL
        #[arg(long)]
        host: Option<String>,
        /// API token sent as a bearer token
        #[arg(long)]
        api_token: Option<String>,
        #[arg(long)]
        company_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        /// Overwrite an existing environment without asking
        #[arg(short, long)]
        force: bool,
        /// Make this the current environment
        #[arg(long)]
        set_current: bool,
    },
    /// List configured environments
    List,
    /// Select the current environment
    Select {
        /// Environment name to select
        name: Option<String>,
    },
    /// Remove an environment
    Remove {
        name: String,
        /// Remove without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn env_command(cmd: EnvCommands) -> Result<()> {
    let mut config = Config::load()?;

    match cmd.command {
        EnvSubcommands::Add {
            name,
            host,
            api_token,
            company_id,
            user_id,
            force,
            set_current,
        } => {
            let name = prompt_environment_name(name)?;
            if config.environments.contains_key(&name) && !force && !prompt_overwrite_confirmation(&name)? {
                println!("{} Cancelled.", "❌".bright_red().bold());
                return Ok(());
            }

            let environment = prompt_environment(host, api_token, company_id, user_id)?;
            config.add_environment(name.clone(), environment);
            if set_current {
                config.set_current_environment(&name)?;
            }
            config.save()?;

            println!("{} Environment '{}' saved", "✓".bright_green().bold(), name.bright_green().bold());
            if config.get_current_environment_name() == Some(name.as_str()) {
                println!("{} '{}' is the current environment", "✓".bright_green().bold(), name.bright_green().bold());
            }
            Ok(())
        }
        EnvSubcommands::List => {
            list_environments(&config);
            Ok(())
        }
        EnvSubcommands::Select { name } => {
            let environments = config.list_environments();
            if environments.is_empty() {
                println!("No environments configured. Run 'esign-cli env add' to create one.");
                return Ok(());
            }

            let selected = match name {
                Some(name) => name,
                None => prompt_environment_selection(&environments, config.get_current_environment_name())?,
            };

            config.set_current_environment(&selected)?;
            config.save()?;
            println!("{} Selected environment: {}", "✓".bright_green().bold(), selected.bright_green().bold());
            Ok(())
        }
        EnvSubcommands::Remove { name, force } => {
            info!("Removing environment: {}", name);

            if !config.environments.contains_key(&name) {
                println!("Environment '{}' not found.", name);
                list_environments(&config);
                return Ok(());
            }

            if config.get_current_environment_name() == Some(name.as_str()) {
                println!("{} '{}' is the current environment", "⚠".bright_yellow().bold(), name);
            }

            if !force && !prompt_remove_confirmation(&name)? {
                println!("Removal cancelled.");
                return Ok(());
            }

            config.remove_environment(&name)?;
            config.save()?;
            println!("{} Environment '{}' removed", "✓".bright_green().bold(), name);

            if config.get_current_environment_name().is_none() {
                println!("No current environment selected. Run 'esign-cli env select' to choose one.");
            }
            Ok(())
        }
    }
}

fn list_environments(config: &Config) {
    let environments = config.list_environments();
    if environments.is_empty() {
        println!("  {}", "⚠️  No environments configured".bright_yellow().bold());
        println!("  {}", "Run 'esign-cli env add' to get started.".dimmed());
        return;
    }

    println!();
    println!("  {}", "Configured environments:".bright_white().bold());
    for name in environments {
        let Some(environment) = config.environments.get(name) else {
            continue;
        };

        if config.get_current_environment_name() == Some(name) {
            println!(
                "  {} {} → {} (company {}){}",
                "●".bright_green(),
                name.bright_green().bold(),
                environment.host.cyan(),
                environment.company_id.bright_yellow(),
                " (current)".bright_green()
            );
        } else {
            println!(
                "  {} {} → {} (company {})",
                "○".bright_green(),
                name.white(),
                environment.host.cyan(),
                environment.company_id.bright_yellow()
            );
        }
    }
    println!();
}
