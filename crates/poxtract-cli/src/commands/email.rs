//! Email command - handle one email message the way the storage trigger does.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use poxtract_core::{EmailReport, FsSink};

use super::{GlobalOpts, file_name};

/// Arguments for the email command.
#[derive(Args)]
pub struct EmailArgs {
    /// Email message JSON file
    #[arg(required = true)]
    message: PathBuf,

    /// Blob name of the message as `<container>/<path>` (default: `emails/<file name>`)
    #[arg(short, long)]
    blob_name: Option<String>,

    /// Root directory for stored attachments, records and the queue
    #[arg(long)]
    output_root: Option<PathBuf>,
}

pub async fn run(args: EmailArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let config = globals.load_config()?;

    if !args.message.exists() {
        anyhow::bail!("Message file not found: {}", args.message.display());
    }

    let blob_name = args
        .blob_name
        .unwrap_or_else(|| format!("emails/{}", file_name(&args.message)));
    let root = args
        .output_root
        .unwrap_or_else(|| config.output.root.clone());

    info!("Handling {} into {}", blob_name, root.display());

    let pipeline = globals.pipeline(&config)?;
    let sink = FsSink::new(root.clone(), config.output.queue_name.as_str());
    let message = fs::read(&args.message)?;

    let report = pipeline.handle_email(&message, &blob_name, &sink).await?;

    print_report(&blob_name, &report);
    println!(
        "{} Queue: {}",
        style("ℹ").blue(),
        sink.queue_path().display()
    );

    Ok(())
}

pub fn print_report(blob_name: &str, report: &EmailReport) {
    println!(
        "{} {}: {} attachments, {} PDF",
        style("✓").green(),
        blob_name,
        report.attachments,
        report.pdf_attachments
    );
    if let Some(subject) = &report.subject {
        println!("   Subject: {}", subject);
    }
    println!(
        "   {} records, {} skipped, {} failed",
        style(report.records.len()).green(),
        style(report.skipped).yellow(),
        style(report.failed).red()
    );
    for key in &report.records {
        println!("  - {}", key);
    }
}
