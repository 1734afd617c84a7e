//! Target environment management

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::config::{Config, EnvironmentConfig};

#[derive(Args)]
pub struct EnvCommands {
    #[command(subcommand)]
    pub command: EnvSubcommands,
}

#[derive(Subcommand)]
pub enum EnvSubcommands {
    /// Add a named environment
    Add {
        /// Environment name (e.g., "production", "test")
        name: String,
        /// Repository snapshot file of this environment
        #[arg(long)]
        repository: PathBuf,
        /// Make it the current environment
        #[arg(long)]
        set_current: bool,
    },
    /// List configured environments
    List,
    /// Select the current environment
    Select {
        /// Environment name to select
        name: String,
    },
    /// Remove an environment
    Remove {
        /// Environment name to remove
        name: String,
    },
}

pub fn env_command(config: &mut Config, cmd: EnvCommands) -> Result<()> {
    match cmd.command {
        EnvSubcommands::Add {
            name,
            repository,
            set_current,
        } => {
            config.add_environment(name.clone(), EnvironmentConfig { repository })?;
            println!("{} Environment '{}' added successfully", "✓".bright_green().bold(), name.bright_green().bold());
            if set_current {
                config.set_current_environment(name.clone())?;
                println!("{} Set '{}' as current environment", "✓".bright_green().bold(), name.bright_green().bold());
            }
            Ok(())
        }
        EnvSubcommands::List => {
            list_environments(config);
            Ok(())
        }
        EnvSubcommands::Select { name } => {
            config.set_current_environment(name.clone())?;
            println!("{} Set '{}' as current environment", "✓".bright_green().bold(), name.bright_green().bold());
            Ok(())
        }
        EnvSubcommands::Remove { name } => {
            config.remove_environment(&name)?;
            println!("{} Environment '{}' removed", "✓".bright_green().bold(), name.bright_green().bold());
            Ok(())
        }
    }
}

fn list_environments(config: &Config) {
    if config.environments.is_empty() {
        println!("  {}", "⚠️  No environments configured".bright_yellow().bold());
        println!("  {}", "Add one with 'docflow-transfer env add'.".dimmed());
        return;
    }

    println!();
    println!("  {}", "Configured environments:".bright_white().bold());
    for (name, environment) in &config.environments {
        let (marker, env_color, current_text) = if config.current_environment.as_ref() == Some(name) {
            ("●", name.bright_green().bold(), " (current)".bright_green())
        } else {
            ("○", name.white(), "".white())
        };
        println!(
            "  {} {} → {}{}",
            marker.bright_green(),
            env_color,
            environment.repository.display().to_string().cyan(),
            current_text
        );
    }
    println!();
}
