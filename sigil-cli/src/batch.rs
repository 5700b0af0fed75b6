//! Batch roster ingestion.
//!
//! Discovers every CSV under a reports folder and runs each one through
//! parse → ensure `cert_<event>` → publish, one file at a time. A failing
//! file is recorded in the summary and the run moves on to the next one.
//!
//! ## Per-file states
//!
//! ```text
//! Discovered → Parsing → ParseFailed | NoRecords
//!                      → Publishing → PublishFailed
//!                                   → Archived | LeftInPlace
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::BatchError;
use crate::queue::{publish_json, Broker, QueueIdentity};
use crate::roster::{event_name_from_path, parse_roster, RosterSchema};

/// Subdirectory of the reports folder that successful files are moved into.
pub const PROCESSED_DIR: &str = "processed";

/// Terminal state of one roster file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Published and moved to the given path
    Archived(PathBuf),
    /// Published; the file was not moved
    LeftInPlace,
    /// The file could not be read or named
    ParseFailed(String),
    /// The file parsed but had no valid rows
    NoRecords,
    /// Declaring the queue or publishing a record failed
    PublishFailed(String),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Archived(_) | FileOutcome::LeftInPlace)
    }
}

/// What happened to one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub queue: Option<String>,
    pub published: usize,
    pub outcome: FileOutcome,
}

/// Tally of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    fn record(&mut self, report: FileReport) {
        if report.outcome.is_success() {
            self.processed += 1;
        } else {
            self.failed += 1;
        }
        self.reports.push(report);
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Recursively collect CSV files under `root`, sorted by file name within
/// each directory. The `processed` archive directory is not descended into.
pub fn discover_csv_files(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() == 1
                && entry.file_type().is_dir()
                && entry.file_name() == PROCESSED_DIR)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| BatchError::Discovery {
            root: root.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        if path.is_file() && has_csv_extension(path) {
            files.push(path.to_path_buf());
        }
    }

    info!(root = %root.display(), files = files.len(), "csv_files_discovered");
    Ok(files)
}

/// Move `path` into `<root>/processed/`, creating the directory if needed.
/// Refuses to replace a file already archived under the same name.
fn archive(root: &Path, path: &Path) -> io::Result<PathBuf> {
    let dir = root.join(PROCESSED_DIR);
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let destination = dir.join(file_name);

    if destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }

    fs::rename(path, &destination)?;
    Ok(destination)
}

/// Publishes roster files to their `cert_<event>` queues through one broker.
pub struct RosterIngestor<'b, B: Broker + ?Sized> {
    broker: &'b mut B,
    schema: RosterSchema,
}

impl<'b, B: Broker + ?Sized> RosterIngestor<'b, B> {
    pub fn new(broker: &'b mut B, schema: RosterSchema) -> Self {
        Self { broker, schema }
    }

    /// Parse and publish a single roster. Never moves the file.
    pub async fn ingest_file(&mut self, path: &Path) -> FileReport {
        let mut report = FileReport {
            path: path.to_path_buf(),
            queue: None,
            published: 0,
            outcome: FileOutcome::LeftInPlace,
        };

        let parsed = event_name_from_path(path)
            .and_then(|event| Ok((event, parse_roster(path, &self.schema)?)));

        let (event, records) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(path = %path.display(), error = %e, "roster_parse_failed");
                report.outcome = FileOutcome::ParseFailed(e.to_string());
                return report;
            }
        };

        let queue = QueueIdentity::cert(event).name();
        report.queue = Some(queue.clone());

        if records.is_empty() {
            warn!(path = %path.display(), queue = %queue, "roster_has_no_valid_records");
            report.outcome = FileOutcome::NoRecords;
            return report;
        }

        if let Err(e) = self.broker.declare_queue(&queue).await {
            error!(path = %path.display(), queue = %queue, error = %e, "roster_queue_declare_failed");
            report.outcome = FileOutcome::PublishFailed(e.to_string());
            return report;
        }

        for record in &records {
            let message_id = record.message_id(&queue);
            if let Err(e) = publish_json(&mut *self.broker, &queue, &message_id, record).await {
                error!(
                    path = %path.display(),
                    queue = %queue,
                    line = record.line,
                    published = report.published,
                    error = %e,
                    "roster_publish_failed"
                );
                report.outcome = FileOutcome::PublishFailed(e.to_string());
                return report;
            }
            report.published += 1;
        }

        info!(
            path = %path.display(),
            queue = %queue,
            published = report.published,
            "roster_published"
        );

        report
    }

    /// Ingest every CSV under `root`. Only discovery errors abort the run.
    pub async fn run_batch(
        &mut self,
        root: &Path,
        move_processed: bool,
    ) -> Result<BatchSummary, BatchError> {
        let files = discover_csv_files(root)?;
        let mut summary = BatchSummary::default();

        for path in files {
            let mut report = self.ingest_file(&path).await;

            if move_processed && report.outcome.is_success() {
                match archive(root, &path) {
                    Ok(destination) => {
                        info!(
                            from = %path.display(),
                            to = %destination.display(),
                            "roster_archived"
                        );
                        report.outcome = FileOutcome::Archived(destination);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "roster_archive_failed");
                    }
                }
            }

            summary.record(report);
        }

        info!(
            root = %root.display(),
            processed = summary.processed,
            failed = summary.failed,
            "batch_complete"
        );

        Ok(summary)
    }
}
