use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::process::ExitCode;

use docflow_transfer::cli::commands::{env_command, export_command, import_command, serializers_command};
use docflow_transfer::cli::{Cli, Commands};
use docflow_transfer::config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    // Log to file, truncated on each run
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&config.settings.log_file)
        .with_context(|| format!("Failed to open log file {:?}", config.settings.log_file))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Starting docflow-transfer with config {:?}", config.path());

    let complete = match cli.command {
        Commands::Export(args) => export_command(&config, args).await?,
        Commands::Import(args) => import_command(&config, args).await?,
        Commands::Serializers => {
            serializers_command(&config)?;
            true
        }
        Commands::Env(cmd) => {
            env_command(&mut config, cmd)?;
            true
        }
    };

    Ok(if complete { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
