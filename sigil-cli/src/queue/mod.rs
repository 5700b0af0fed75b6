//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - Queue naming (`cert_<event>`, `dispatch_<event>`) and the roster message type
//! - The [`Broker`] seam and its lapin-backed [`Gateway`]
//!
//! ## Queues per event
//!
//! ```text
//! roster CSV → cert_<event> → certificate worker → dispatch_<event> → dispatch worker
//! ```

pub mod gateway;
pub mod types;

#[cfg(test)]
pub(crate) mod memory;

pub use gateway::{publish_json, Broker, Gateway};
pub use types::{QueueIdentity, QueueKind, StudentRecord, CERT_PREFIX, DISPATCH_PREFIX};
