//! Events file reading.
//!
//! One event name per line. Lines are trimmed, blanks dropped and repeats
//! collapsed to the first occurrence.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::EventsError;

/// Read event names from `path`.
pub fn read_events_file(path: &Path) -> Result<Vec<String>, EventsError> {
    let file = File::open(path).map_err(|source| EventsError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| EventsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        lines.push(line);
    }

    let events = normalize_events(lines);
    debug!(path = %path.display(), events = events.len(), "events_file_read");
    Ok(events)
}

/// Trim, drop blanks and de-duplicate, keeping first-seen order.
pub fn normalize_events<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_events_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"orientation\n\nwelcome\n").unwrap();

        let events = read_events_file(file.path()).unwrap();
        assert_eq!(events, vec!["orientation", "welcome"]);
    }

    #[test]
    fn test_normalize_trims_and_dedupes() {
        let events = normalize_events(["  gala ", "", "gala", "\t", "awards", "gala\r"]);
        assert_eq!(events, vec!["gala", "awards"]);
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = read_events_file(Path::new("/nonexistent/events.txt")).unwrap_err();
        assert!(matches!(err, EventsError::Open { .. }));
    }
}
