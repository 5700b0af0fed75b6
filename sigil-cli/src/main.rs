//! Sigil CLI - provisions event queues and ingests CSV rosters.
//!
//! Commands:
//! - `create <events-file>`: declare `cert_<event>` and `dispatch_<event>` per line
//! - `process <csv-file>`: publish one roster to its `cert_<event>` queue
//! - `process-batch <reports-folder> [--move]`: publish every roster under a folder

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sigil::{
    config::DEFAULT_CONFIG_PATH, provision, read_events_file, BatchSummary, Config, FileOutcome,
    Gateway, RosterIngestor, RosterSchema, PROCESSED_DIR,
};

#[derive(Parser, Debug)]
#[command(name = "sigil")]
#[command(about = "Provision RabbitMQ event queues and publish CSV rosters")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create cert_ and dispatch_ queues for each event in a file
    Create {
        /// File with one event name per line
        events_file: PathBuf,
    },
    /// Publish a single CSV roster to its cert_ queue
    Process {
        csv_file: PathBuf,
    },
    /// Publish every CSV roster found under a folder
    ProcessBatch {
        reports_folder: PathBuf,

        /// Move successfully processed files into <reports-folder>/processed
        #[arg(long = "move")]
        move_processed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("Error loading config from {}", cli.config.display()))?;

    // Structured JSON logs on stderr; stdout carries the human-readable report
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(std::io::stderr),
        )
        .init();

    info!(
        url = %config.redacted_url(),
        smtp_configured = config.smtp_configured(),
        required_columns = ?config.roster.required_columns,
        "config_loaded"
    );

    for env_var in &config.ignored_overrides {
        warn!(env_var = %env_var, "Empty override, keeping config value");
    }

    match cli.command {
        Command::Create { events_file } => create(&config, &events_file).await,
        Command::Process { csv_file } => process(&config, &csv_file).await,
        Command::ProcessBatch {
            reports_folder,
            move_processed,
        } => process_batch(&config, &reports_folder, move_processed).await,
    }
}

fn roster_schema(config: &Config) -> RosterSchema {
    match &config.roster.required_columns {
        Some(columns) => RosterSchema::required(columns.iter().cloned()),
        None => RosterSchema::all_columns(),
    }
}

async fn create(config: &Config, events_file: &Path) -> Result<ExitCode> {
    let events = read_events_file(events_file).context("Error reading events file")?;
    println!("Found {} events", events.len());

    let mut gateway = Gateway::connect(config)
        .await
        .context("Failed to connect to RabbitMQ")?;
    let report = provision(&mut gateway, &events).await;
    gateway.close().await;

    for queue in &report.created {
        println!("Created queue: {queue}");
    }
    for queue in &report.existing {
        println!("Queue {queue} already exists, skipping");
    }
    for queue in &report.failed {
        println!("Failed to create queue: {queue}");
    }

    println!(
        "Queue creation completed: {} queues checked, {} created, {} failed",
        report.total(),
        report.created.len(),
        report.failed.len()
    );
    Ok(ExitCode::SUCCESS)
}

async fn process(config: &Config, csv_file: &Path) -> Result<ExitCode> {
    if !csv_file.is_file() {
        bail!("CSV file not found: {}", csv_file.display());
    }

    let mut gateway = Gateway::connect(config)
        .await
        .context("Failed to connect to RabbitMQ")?;
    let report = RosterIngestor::new(&mut gateway, roster_schema(config))
        .ingest_file(csv_file)
        .await;
    gateway.close().await;

    let queue = report.queue.as_deref().unwrap_or("-");
    match &report.outcome {
        FileOutcome::ParseFailed(reason) | FileOutcome::PublishFailed(reason) => {
            println!("Failed to process {}: {reason}", csv_file.display());
            Ok(ExitCode::FAILURE)
        }
        FileOutcome::NoRecords => {
            println!("No valid records found in {}", csv_file.display());
            Ok(ExitCode::FAILURE)
        }
        FileOutcome::Archived(_) | FileOutcome::LeftInPlace => {
            println!("Published {} records to {queue}", report.published);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn process_batch(config: &Config, root: &Path, move_processed: bool) -> Result<ExitCode> {
    if !root.is_dir() {
        bail!("Reports folder not found: {}", root.display());
    }

    let mut gateway = Gateway::connect(config)
        .await
        .context("Failed to connect to RabbitMQ")?;
    let summary = RosterIngestor::new(&mut gateway, roster_schema(config))
        .run_batch(root, move_processed)
        .await;
    gateway.close().await;

    let summary = summary.context("Error scanning reports folder")?;
    print_summary(&summary, move_processed);

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_summary(summary: &BatchSummary, move_processed: bool) {
    for report in &summary.reports {
        let path = report.path.display();
        match &report.outcome {
            FileOutcome::Archived(to) => {
                println!("OK     {path} ({} records, moved to {})", report.published, to.display())
            }
            FileOutcome::LeftInPlace => {
                if move_processed {
                    println!("OK     {path} ({} records, not moved to {PROCESSED_DIR}/)", report.published)
                } else {
                    println!("OK     {path} ({} records)", report.published)
                }
            }
            FileOutcome::NoRecords => println!("FAILED {path}: no valid records"),
            FileOutcome::ParseFailed(reason) | FileOutcome::PublishFailed(reason) => {
                println!("FAILED {path}: {reason}")
            }
        }
    }

    println!(
        "Batch complete: {} processed, {} failed",
        summary.processed, summary.failed
    );
}
