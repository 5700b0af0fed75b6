//! Error types shared across the library.
//!
//! Each error carries the file, queue or operation it relates to so that a
//! single log line is enough to act on.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or validating `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures talking to the message broker.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to connect to RabbitMQ at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to open a channel: {0}")]
    Channel(#[source] lapin::Error),

    #[error("failed to declare queue {queue}: {source}")]
    Declare {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to check if queue {queue} exists: {source}")]
    Query {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to publish to queue {queue}: {source}")]
    Publish {
        queue: String,
        #[source]
        source: lapin::Error,
    },

    #[error("failed to serialize message for queue {queue}: {source}")]
    Serialize {
        queue: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reading an events file.
#[derive(Debug, Error)]
pub enum EventsError {
    #[error("failed to open file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that make a whole roster file unusable.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to open roster {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading roster {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("roster {path} has no header row")]
    Header { path: PathBuf },

    #[error("roster {path} has duplicate column {column:?} in its header")]
    DuplicateColumn { path: PathBuf, column: String },

    #[error("roster {path} is missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("cannot derive an event name from {path}")]
    EventName { path: PathBuf },
}

/// Failures that abort a batch run before any file is attempted.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to scan reports folder {root}: {source}")]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
