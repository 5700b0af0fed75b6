//! Roster module: CSV parsing and event name derivation.
//!
//! ## Flow
//!
//! ```text
//! fall2024.csv → event_name_from_path() → "fall2024" → cert_fall2024
//!              → parse_roster()         → Vec<StudentRecord>
//! ```

pub mod parser;

use std::path::Path;

use crate::error::RosterError;

pub use parser::{parse_roster, RosterSchema};

/// Prefix some exports carry once they have been handled upstream.
const STATUS_PREFIXES: &[&str] = &["processed_"];

/// Suffixes marking a processing status rather than part of the event name.
const STATUS_SUFFIXES: &[&str] = &["_processed", "_failed"];

/// Derive the event name from a roster's file name.
///
/// `reports/fall2024.csv` → `fall2024`, `processed_gala_failed.csv` → `gala`.
pub fn event_name_from_path(path: &Path) -> Result<String, RosterError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RosterError::EventName {
            path: path.to_path_buf(),
        })?;

    let mut name = stem.trim();
    for prefix in STATUS_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest;
        }
    }
    for suffix in STATUS_SUFFIXES {
        if let Some(rest) = name.strip_suffix(suffix) {
            name = rest;
        }
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::EventName {
            path: path.to_path_buf(),
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_from_plain_file() {
        let name = event_name_from_path(Path::new("reports/fall2024.csv")).unwrap();
        assert_eq!(name, "fall2024");
    }

    #[test]
    fn test_event_name_strips_status_markers() {
        assert_eq!(
            event_name_from_path(Path::new("processed_gala.csv")).unwrap(),
            "gala"
        );
        assert_eq!(
            event_name_from_path(Path::new("gala_failed.CSV")).unwrap(),
            "gala"
        );
        assert_eq!(
            event_name_from_path(Path::new("spring_orientation_processed.csv")).unwrap(),
            "spring_orientation"
        );
    }

    #[test]
    fn test_event_name_empty_is_error() {
        let err = event_name_from_path(Path::new("_processed.csv")).unwrap_err();
        assert!(matches!(err, RosterError::EventName { .. }));
    }
}
