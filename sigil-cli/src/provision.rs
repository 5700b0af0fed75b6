//! Idempotent queue provisioning.
//!
//! For every event both `cert_<event>` and `dispatch_<event>` are checked with
//! a passive declare and only declared when missing. A failure on one queue is
//! logged and recorded; the remaining queues are still attempted.

use tracing::{error, info};

use crate::events::normalize_events;
use crate::queue::{Broker, QueueIdentity};

/// Outcome of a provisioning run, by queue name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
    pub failed: Vec<String>,
}

impl ProvisionReport {
    pub fn total(&self) -> usize {
        self.created.len() + self.existing.len() + self.failed.len()
    }
}

/// Ensure the queue pair for every event exists.
pub async fn provision<B, I, S>(broker: &mut B, events: I) -> ProvisionReport
where
    B: Broker + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ProvisionReport::default();

    for event in normalize_events(events) {
        for identity in QueueIdentity::pair(&event) {
            let queue = identity.name();

            match broker.queue_exists(&queue).await {
                Ok(true) => {
                    info!(queue = %queue, "queue_already_exists");
                    report.existing.push(queue);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(queue = %queue, error = %e, "queue_exists_check_failed");
                    report.failed.push(queue);
                    continue;
                }
            }

            match broker.declare_queue(&queue).await {
                Ok(()) => {
                    info!(queue = %queue, "queue_created");
                    report.created.push(queue);
                }
                Err(e) => {
                    error!(queue = %queue, error = %e, "queue_declare_failed");
                    report.failed.push(queue);
                }
            }
        }
    }

    info!(
        created = report.created.len(),
        existing = report.existing.len(),
        failed = report.failed.len(),
        "queue_provisioning_complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::memory::MemoryBroker;

    #[tokio::test]
    async fn test_provision_creates_pairs_and_ignores_blanks() {
        let mut broker = MemoryBroker::new();

        let report = provision(&mut broker, ["orientation", "", "welcome"]).await;

        assert_eq!(
            report.created,
            vec![
                "cert_orientation",
                "dispatch_orientation",
                "cert_welcome",
                "dispatch_welcome"
            ]
        );
        assert!(report.failed.is_empty());
        assert_eq!(broker.queue_names().len(), 4);
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let mut broker = MemoryBroker::new();

        provision(&mut broker, ["gala"]).await;
        let second = provision(&mut broker, ["gala"]).await;

        assert!(second.created.is_empty());
        assert_eq!(second.existing, vec!["cert_gala", "dispatch_gala"]);
        assert_eq!(broker.queue_names(), vec!["cert_gala", "dispatch_gala"]);
        assert_eq!(broker.declare_calls, 2);
    }

    #[tokio::test]
    async fn test_provision_dedupes_and_trims() {
        let mut broker = MemoryBroker::new();

        let report = provision(&mut broker, [" gala", "gala ", "\n", "gala"]).await;

        assert_eq!(report.total(), 2);
        assert_eq!(broker.queue_names(), vec!["cert_gala", "dispatch_gala"]);
    }

    #[tokio::test]
    async fn test_provision_continues_after_failures() {
        let mut broker = MemoryBroker::new().with_queue("dispatch_welcome");
        broker.fail_declare.insert("cert_orientation".to_string());
        broker.fail_exists.insert("dispatch_orientation".to_string());

        let report = provision(&mut broker, ["orientation", "welcome"]).await;

        assert_eq!(report.failed, vec!["cert_orientation", "dispatch_orientation"]);
        assert_eq!(report.created, vec!["cert_welcome"]);
        assert_eq!(report.existing, vec!["dispatch_welcome"]);
    }
}
