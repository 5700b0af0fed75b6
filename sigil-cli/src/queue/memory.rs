//! In-memory broker used by unit tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use lapin::protocol::{AMQPError, AMQPErrorKind, AMQPSoftError};

use super::gateway::Broker;
use crate::error::GatewayError;

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub message_id: String,
    pub body: Vec<u8>,
}

/// Queues and messages kept in hash maps, with per-queue failure injection.
#[derive(Debug, Default)]
pub struct MemoryBroker {
    queues: HashMap<String, Vec<StoredMessage>>,
    pub declare_calls: usize,
    pub fail_declare: HashSet<String>,
    pub fail_exists: HashSet<String>,
    pub fail_publish: HashSet<String>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: &str) -> Self {
        self.queues.entry(queue.to_string()).or_default();
        self
    }

    pub fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn messages(&self, queue: &str) -> Vec<StoredMessage> {
        self.queues.get(queue).cloned().unwrap_or_default()
    }

    /// The channel-level error RabbitMQ would send back.
    fn soft_error(kind: AMQPSoftError, reason: &str) -> lapin::Error {
        lapin::Error::ProtocolError(AMQPError::new(AMQPErrorKind::Soft(kind), reason.into()))
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn declare_queue(&mut self, queue: &str) -> Result<(), GatewayError> {
        self.declare_calls += 1;
        if self.fail_declare.contains(queue) {
            return Err(GatewayError::Declare {
                queue: queue.to_string(),
                source: Self::soft_error(AMQPSoftError::PRECONDITIONFAILED, "injected failure"),
            });
        }
        self.queues.entry(queue.to_string()).or_default();
        Ok(())
    }

    async fn queue_exists(&mut self, queue: &str) -> Result<bool, GatewayError> {
        if self.fail_exists.contains(queue) {
            return Err(GatewayError::Query {
                queue: queue.to_string(),
                source: Self::soft_error(AMQPSoftError::ACCESSREFUSED, "injected failure"),
            });
        }
        Ok(self.queues.contains_key(queue))
    }

    async fn publish(
        &mut self,
        queue: &str,
        message_id: &str,
        payload: &[u8],
    ) -> Result<(), GatewayError> {
        if self.fail_publish.contains(queue) {
            return Err(GatewayError::Publish {
                queue: queue.to_string(),
                source: Self::soft_error(AMQPSoftError::ACCESSREFUSED, "injected failure"),
            });
        }
        let messages = self
            .queues
            .get_mut(queue)
            .ok_or_else(|| GatewayError::Publish {
                queue: queue.to_string(),
                source: Self::soft_error(AMQPSoftError::NOTFOUND, "no such queue"),
            })?;
        messages.push(StoredMessage {
            message_id: message_id.to_string(),
            body: payload.to_vec(),
        });
        Ok(())
    }
}
