use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use log::info;
use std::path::PathBuf;

use crate::config::Config;
use crate::repository::MemoryRepository;
use crate::serializers::builtin_registry;
use crate::transfer::{ExportReport, ImportReport, RecordFailure, TransferEngine};

#[derive(Args)]
pub struct ExportArgs {
    /// Logical entity type, e.g. ApprovalRule
    #[arg(short, long)]
    pub entity_type: String,
    /// Output file, replaced if it exists
    #[arg(short, long)]
    pub file: PathBuf,
    /// Source environment (defaults to the current one)
    #[arg(long)]
    pub env: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// File produced by a previous export
    #[arg(short, long)]
    pub file: PathBuf,
    /// Entity type for files without a header record
    #[arg(short, long)]
    pub entity_type: Option<String>,
    /// Target environment (defaults to the current one)
    #[arg(long)]
    pub env: Option<String>,
}

async fn open_engine(config: &Config, env: Option<&str>) -> Result<TransferEngine<MemoryRepository>> {
    let (name, environment) = config.resolve_environment(env)?;
    info!("Using environment {} ({:?})", name, environment.repository);

    let repository = MemoryRepository::open(&environment.repository)
        .await
        .with_context(|| format!("Failed to open repository of environment '{}'", name))?;
    let registry = builtin_registry(&config.serializer_options())?;
    Ok(TransferEngine::new(registry, repository).with_pretty_output(config.settings.pretty_output))
}

fn print_failures(failures: &[RecordFailure]) {
    for failure in failures {
        println!(
            "  {} #{} {} [{}] {}",
            "✗".bright_red().bold(),
            failure.index,
            failure.name.as_deref().unwrap_or("<unnamed>").bright_white(),
            failure.kind.to_string().bright_yellow(),
            failure.message.dimmed()
        );
    }
}

fn print_export_report(report: &ExportReport, file: &std::path::Path) {
    let marker = if report.is_complete() {
        "✓".bright_green().bold()
    } else {
        "⚠".bright_yellow().bold()
    };
    println!(
        "{} {}: {} of {} records exported to {}",
        marker,
        report.entity_name.bright_green().bold(),
        report.succeeded(),
        report.attempted(),
        file.display().to_string().cyan()
    );
    print_failures(&report.failures);
}

fn print_import_report(report: &ImportReport) {
    let marker = if report.is_complete() {
        "✓".bright_green().bold()
    } else {
        "⚠".bright_yellow().bold()
    };
    println!(
        "{} {}: {} of {} records imported, {} failed",
        marker,
        report.entity_name.bright_green().bold(),
        report.succeeded(),
        report.attempted,
        report.failed()
    );
    for imported in &report.imported {
        println!("  {} {} (id {})", "+".bright_green(), imported.name, imported.id);
    }
    print_failures(&report.failures);
}

/// Returns whether every record was exported
pub async fn export_command(config: &Config, args: ExportArgs) -> Result<bool> {
    let engine = open_engine(config, args.env.as_deref()).await?;
    let report = engine
        .export_to_file(&args.entity_type, &args.file)
        .await
        .with_context(|| format!("Export of {} failed", args.entity_type))?;
    print_export_report(&report, &args.file);
    Ok(report.is_complete())
}

/// Returns whether every record was imported
pub async fn import_command(config: &Config, args: ImportArgs) -> Result<bool> {
    let mut engine = open_engine(config, args.env.as_deref()).await?;
    let report = engine
        .import_file(&args.file, args.entity_type.as_deref())
        .await
        .with_context(|| format!("Import of {:?} failed", args.file))?;
    print_import_report(&report);
    Ok(report.is_complete())
}

pub fn serializers_command(config: &Config) -> Result<()> {
    let registry = builtin_registry(&config.serializer_options())?;
    println!();
    println!("  {}", "Registered serializers:".bright_white().bold());
    for (name, type_name) in registry.entries() {
        println!("  {} {} → {}", "●".bright_green(), name.bright_green().bold(), type_name.cyan());
    }
    println!();
    Ok(())
}
