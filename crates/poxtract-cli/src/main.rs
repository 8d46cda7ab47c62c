//! CLI application for purchase-order PDF extraction.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{GlobalOpts, batch, config, email, process};

/// poxtract - Extract order data from purchase-order PDFs
#[derive(Parser)]
#[command(name = "poxtract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Answer every extraction call with the JSON in this file instead of calling the API
    #[arg(long, global = true, value_name = "PATH")]
    mock_response: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract order data from a single PDF
    Process(process::ProcessArgs),

    /// Handle an email message: store and extract its PDF attachments
    Email(email::EmailArgs),

    /// Process multiple PDFs or email messages
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let globals = GlobalOpts {
        config: cli.config,
        mock_response: cli.mock_response,
    };

    // Execute command
    match cli.command {
        Commands::Process(args) => process::run(args, &globals).await,
        Commands::Email(args) => email::run(args, &globals).await,
        Commands::Batch(args) => batch::run(args, &globals).await,
        Commands::Config(args) => config::run(args, &globals).await,
    }
}
