//! Queue naming and message types.
//!
//! Downstream consumers depend on the `cert_<event>` / `dispatch_<event>`
//! naming, so these names must not change.

use std::fmt;

use lapin::options::QueueDeclareOptions;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Prefix of the queue that receives roster records for certificate generation.
pub const CERT_PREFIX: &str = "cert";

/// Prefix of the queue used by the dispatch workers.
pub const DISPATCH_PREFIX: &str = "dispatch";

/// Which of the two per-event queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Cert,
    Dispatch,
}

impl QueueKind {
    pub const ALL: [QueueKind; 2] = [QueueKind::Cert, QueueKind::Dispatch];

    pub fn prefix(self) -> &'static str {
        match self {
            QueueKind::Cert => CERT_PREFIX,
            QueueKind::Dispatch => DISPATCH_PREFIX,
        }
    }
}

/// A (kind, event) pair identifying one durable queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueIdentity {
    pub kind: QueueKind,
    pub event: String,
}

impl QueueIdentity {
    pub fn new(kind: QueueKind, event: impl Into<String>) -> Self {
        Self {
            kind,
            event: event.into(),
        }
    }

    pub fn cert(event: impl Into<String>) -> Self {
        Self::new(QueueKind::Cert, event)
    }

    /// Both queues belonging to an event, cert first.
    pub fn pair(event: &str) -> [QueueIdentity; 2] {
        QueueKind::ALL.map(|kind| QueueIdentity::new(kind, event))
    }

    pub fn name(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.event)
    }
}

impl fmt::Display for QueueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.event)
    }
}

/// Properties every queue is declared with, whichever command creates it.
pub fn durable_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        passive: false,
        durable: true,
        exclusive: false,
        auto_delete: false,
        nowait: false,
    }
}

/// Options for an existence check that never creates the queue.
pub fn passive_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        passive: true,
        ..durable_queue_options()
    }
}

/// One roster row, as published to a `cert_<event>` queue.
///
/// Serializes to a JSON object whose keys follow the CSV header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    /// 1-based line number in the source file
    pub line: u64,
    fields: Vec<(String, String)>,
}

impl StudentRecord {
    pub fn new(line: u64, fields: Vec<(String, String)>) -> Self {
        Self { line, fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Message id used when publishing to `queue`.
    pub fn message_id(&self, queue: &str) -> String {
        format!("{}-{}", queue, self.line)
    }
}

impl Serialize for StudentRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
