use super::commands::env::EnvCommands;
use super::commands::transfer::{ExportArgs, ImportArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docflow-transfer")]
#[command(about = "Move document-workflow settings between platform instances")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export every record of an entity type into a file
    Export(ExportArgs),
    /// Import records from a previously exported file
    Import(ImportArgs),
    /// List the registered serializers
    Serializers,
    /// Target environment management
    Env(EnvCommands),
}
