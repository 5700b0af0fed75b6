//! Sigil - RabbitMQ queue provisioning and roster ingestion for certificate
//! workflows.
//!
//! ## Architecture
//!
//! ```text
//! events.txt → provision() → cert_<event> + dispatch_<event>
//! reports/*.csv → RosterIngestor → cert_<event> → certificate worker
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod provision;
pub mod queue;
pub mod roster;

// Re-export commonly used types
pub use batch::{discover_csv_files, BatchSummary, FileOutcome, FileReport, RosterIngestor, PROCESSED_DIR};
pub use config::Config;
pub use events::read_events_file;
pub use provision::{provision, ProvisionReport};
pub use queue::{Broker, Gateway, QueueIdentity, QueueKind, StudentRecord};
pub use roster::{event_name_from_path, parse_roster, RosterSchema};
