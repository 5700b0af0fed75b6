//! CSV roster parsing.
//!
//! The first row is the header. Each later row becomes a [`StudentRecord`]
//! when all required columns are present and non-empty; other rows are skipped.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::error::RosterError;
use crate::queue::StudentRecord;

/// Which columns a row must fill in to be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSchema {
    required: Option<Vec<String>>,
}

impl RosterSchema {
    /// Every header column is required.
    pub fn all_columns() -> Self {
        Self { required: None }
    }

    /// Only the named columns are required; they must appear in the header.
    pub fn required(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            required: Some(columns.into_iter().map(Into::into).collect()),
        }
    }
}

/// Header columns resolved to indices.
struct Columns {
    named: Vec<(usize, String)>,
    required: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(path: &Path, header: &StringRecord, schema: &RosterSchema) -> Result<Self, RosterError> {
        let named: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (i, name.trim().trim_start_matches('\u{feff}').to_string()))
            .filter(|(_, name)| !name.is_empty())
            .collect();

        if named.is_empty() {
            return Err(RosterError::Header {
                path: path.to_path_buf(),
            });
        }

        let mut seen = HashSet::new();
        if let Some((_, duplicate)) = named.iter().find(|(_, name)| !seen.insert(name.as_str())) {
            return Err(RosterError::DuplicateColumn {
                path: path.to_path_buf(),
                column: duplicate.clone(),
            });
        }

        let required = match &schema.required {
            None => named.clone(),
            Some(columns) => columns
                .iter()
                .map(|column| {
                    named
                        .iter()
                        .find(|(_, name)| name == column.trim())
                        .cloned()
                        .ok_or_else(|| RosterError::MissingColumn {
                            path: path.to_path_buf(),
                            column: column.clone(),
                        })
                })
                .collect::<Result<_, _>>()?,
        };

        Ok(Self { named, required })
    }

    fn value<'r>(record: &'r StringRecord, index: usize) -> &'r str {
        record.get(index).map(str::trim).unwrap_or("")
    }

    /// First required column that is missing or blank in `record`.
    fn missing<'c>(&'c self, record: &StringRecord) -> Option<&'c str> {
        self.required
            .iter()
            .find(|(i, _)| Self::value(record, *i).is_empty())
            .map(|(_, name)| name.as_str())
    }

    fn to_student(&self, line: u64, record: &StringRecord) -> StudentRecord {
        let fields = self
            .named
            .iter()
            .map(|(i, name)| (name.clone(), Self::value(record, *i).to_string()))
            .collect();
        StudentRecord::new(line, fields)
    }
}

/// Parse the roster at `path` into records, in file order.
///
/// An empty result is not an error here; the caller decides what it means.
pub fn parse_roster(path: &Path, schema: &RosterSchema) -> Result<Vec<StudentRecord>, RosterError> {
    let file = File::open(path).map_err(|source| RosterError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = reader.records();

    let header = match rows.next() {
        Some(Ok(header)) => header,
        Some(Err(source)) => {
            return Err(RosterError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
        None => {
            return Err(RosterError::Header {
                path: path.to_path_buf(),
            })
        }
    };

    let columns = Columns::resolve(path, &header, schema)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), ErrorKind::Io(_)) => {
                return Err(RosterError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = e.position().map(|p| p.line()),
                    error = %e,
                    "roster_row_unreadable"
                );
                skipped += 1;
                continue;
            }
        };

        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if let Some(column) = columns.missing(&row) {
            debug!(
                path = %path.display(),
                line = line,
                column = %column,
                "roster_row_skipped"
            );
            skipped += 1;
            continue;
        }

        records.push(columns.to_student(line, &row));
    }

    info!(
        path = %path.display(),
        records = records.len(),
        skipped = skipped,
        "roster_parsed"
    );

    Ok(records)
}
