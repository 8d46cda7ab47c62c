//! Batch processing command for multiple PDFs or email messages.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use poxtract_core::models::order::OutputRecord;
use poxtract_core::{DocumentOutcome, EmailReport, FsSink, OrderPipeline};

use super::process::{OutputFormat, format_record};
use super::{GlobalOpts, file_name};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching `.pdf` files or `.json` email messages
    #[arg(required = true)]
    input: String,

    /// Output directory for per-PDF results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each PDF
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Container used in the blob name of each email message
    #[arg(long, default_value = "emails")]
    container: String,

    /// Root directory for email outputs (default: from config)
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

enum FileOutcome {
    Record(Box<OutputRecord>),
    Skipped(String),
    Email(EmailReport),
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Result<FileOutcome, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = globals.load_config()?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| matches!(extension(p).as_str(), "pdf" | "json"))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = globals.pipeline(&config)?;
    let sink = FsSink::new(
        args.output_root
            .clone()
            .unwrap_or_else(|| config.output.root.clone()),
        config.output.queue_name.as_str(),
    );

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &pipeline, &sink, &args).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        let outcome = match outcome {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    Err(error_msg)
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        };

        results.push(ProcessResult {
            path,
            outcome,
            processing_time_ms,
        });
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            if let Ok(FileOutcome::Record(record)) = &result.outcome {
                let stem = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("order");
                let output_path =
                    output_dir.join(format!("{}.{}", stem, args.format.extension()));
                fs::write(&output_path, format_record(record, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.outcome, Ok(FileOutcome::Skipped(_))))
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} skipped, {} failed",
        style(results.len() - failed.len() - skipped).green(),
        style(skipped).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(e) = &result.outcome {
                println!("  - {}: {}", result.path.display(), e);
            }
        }
    }

    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

async fn process_single_file(
    path: &Path,
    pipeline: &OrderPipeline,
    sink: &FsSink,
    args: &BatchArgs,
) -> anyhow::Result<FileOutcome> {
    let data = fs::read(path)?;
    let name = file_name(path);

    match extension(path).as_str() {
        "pdf" => match pipeline.process_pdf(&data, &name).await? {
            DocumentOutcome::Extracted(record) => Ok(FileOutcome::Record(record)),
            DocumentOutcome::OverTokenLimit { tokens, limit } => Ok(FileOutcome::Skipped(
                format!("too many tokens: {} > {}", tokens, limit),
            )),
            DocumentOutcome::NoText => Ok(FileOutcome::Skipped("no text".to_string())),
            DocumentOutcome::AmbiguousAddress(e) => Ok(FileOutcome::Skipped(e.to_string())),
        },
        "json" => {
            let blob_name = format!("{}/{}", args.container, name);
            let report = pipeline.handle_email(&data, &blob_name, sink).await?;
            Ok(FileOutcome::Email(report))
        }
        other => anyhow::bail!("Unsupported file format: {}", other),
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "order_number",
        "company_name",
        "total_price",
        "records",
        "processing_time_ms",
        "detail",
    ])?;

    for result in results {
        let filename = file_name(&result.path);
        let time = result.processing_time_ms.to_string();

        match &result.outcome {
            Ok(FileOutcome::Record(record)) => {
                let order = &record.data.other_info.order;
                wtr.write_record([
                    filename.as_str(),
                    "success",
                    &order.order_number,
                    &order.company_name,
                    &record.data.product_table.total_price.to_string(),
                    "1",
                    &time,
                    "",
                ])?;
            }
            Ok(FileOutcome::Skipped(reason)) => {
                wtr.write_record([filename.as_str(), "skipped", "", "", "", "0", &time, reason])?;
            }
            Ok(FileOutcome::Email(report)) => {
                let detail = format!(
                    "{} PDF attachments, {} skipped, {} failed",
                    report.pdf_attachments, report.skipped, report.failed
                );
                wtr.write_record([
                    filename.as_str(),
                    "email",
                    "",
                    "",
                    "",
                    &report.records.len().to_string(),
                    &time,
                    &detail,
                ])?;
            }
            Err(e) => {
                wtr.write_record([filename.as_str(), "error", "", "", "", "0", &time, e])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
