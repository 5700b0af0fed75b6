//! RabbitMQ gateway: one connection and one channel per CLI operation.
//!
//! The [`Broker`] trait is the seam the provisioner and the batch
//! orchestrator talk to; [`Gateway`] implements it on top of lapin.

use async_trait::async_trait;
use lapin::{
    options::BasicPublishOptions,
    protocol::{AMQPErrorKind, AMQPSoftError},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::types::{durable_queue_options, passive_queue_options};
use crate::config::Config;
use crate::error::GatewayError;

/// Declare / exists / publish primitives against a message broker.
#[async_trait]
pub trait Broker: Send {
    /// Declare a durable queue. Declaring an existing queue with the same
    /// properties is a no-op.
    async fn declare_queue(&mut self, queue: &str) -> Result<(), GatewayError>;

    /// Check whether a queue exists without creating it.
    async fn queue_exists(&mut self, queue: &str) -> Result<bool, GatewayError>;

    /// Publish a persistent message to `queue` via the default exchange.
    async fn publish(
        &mut self,
        queue: &str,
        message_id: &str,
        payload: &[u8],
    ) -> Result<(), GatewayError>;
}

/// Serialize `message` as JSON and publish it.
pub async fn publish_json<B, T>(
    broker: &mut B,
    queue: &str,
    message_id: &str,
    message: &T,
) -> Result<(), GatewayError>
where
    B: Broker + ?Sized,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message).map_err(|source| GatewayError::Serialize {
        queue: queue.to_string(),
        source,
    })?;

    broker.publish(queue, message_id, &body).await
}

/// lapin-backed broker gateway.
pub struct Gateway {
    connection: Connection,
    channel: Channel,
}

impl Gateway {
    /// Connect to the broker configured in `config` and open a channel.
    pub async fn connect(config: &Config) -> Result<Self, GatewayError> {
        let redacted = config.redacted_url();
        info!(url = %redacted, "rabbitmq_connecting");

        let connection = Connection::connect(&config.rabbitmq.url, ConnectionProperties::default())
            .await
            .map_err(|source| GatewayError::Connect {
                url: redacted,
                source,
            })?;

        info!("rabbitmq_connected");

        let channel = open_channel(&connection).await?;

        Ok(Self {
            connection,
            channel,
        })
    }

    /// Reopen the channel if the broker closed it.
    ///
    /// AMQP closes a channel on any soft error, including the NOT_FOUND
    /// reply to a passive declare.
    async fn ensure_channel(&mut self) -> Result<&Channel, GatewayError> {
        if !self.channel.status().connected() {
            debug!("rabbitmq_channel_reopening");
            self.channel = open_channel(&self.connection).await?;
        }
        Ok(&self.channel)
    }

    /// Close the channel and the connection. Close errors are only logged.
    pub async fn close(self) {
        if self.channel.status().connected() {
            if let Err(e) = self.channel.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Err(e) = self.connection.close(200, "Normal shutdown").await {
            warn!(error = %e, "rabbitmq_connection_close_error");
        }

        info!("rabbitmq_gateway_closed");
    }
}

async fn open_channel(connection: &Connection) -> Result<Channel, GatewayError> {
    let channel = connection
        .create_channel()
        .await
        .map_err(GatewayError::Channel)?;

    debug!(channel_id = channel.id(), "rabbitmq_channel_created");
    Ok(channel)
}

fn is_not_found(err: &lapin::Error) -> bool {
    matches!(
        err,
        lapin::Error::ProtocolError(e)
            if matches!(e.kind(), AMQPErrorKind::Soft(AMQPSoftError::NOTFOUND))
    )
}

#[async_trait]
impl Broker for Gateway {
    async fn declare_queue(&mut self, queue: &str) -> Result<(), GatewayError> {
        let channel = self.ensure_channel().await?;

        channel
            .queue_declare(queue, durable_queue_options(), FieldTable::default())
            .await
            .map_err(|source| GatewayError::Declare {
                queue: queue.to_string(),
                source,
            })?;

        debug!(queue = %queue, "rabbitmq_queue_declared");
        Ok(())
    }

    async fn queue_exists(&mut self, queue: &str) -> Result<bool, GatewayError> {
        let channel = self.ensure_channel().await?;

        match channel
            .queue_declare(queue, passive_queue_options(), FieldTable::default())
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(source) => Err(GatewayError::Query {
                queue: queue.to_string(),
                source,
            }),
        }
    }

    async fn publish(
        &mut self,
        queue: &str,
        message_id: &str,
        payload: &[u8],
    ) -> Result<(), GatewayError> {
        let channel = self.ensure_channel().await?;
        let publish_err = |source: lapin::Error| GatewayError::Publish {
            queue: queue.to_string(),
            source,
        };

        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.into()),
            )
            .await
            .map_err(publish_err)?
            .await
            .map_err(publish_err)?;

        debug!(
            queue = %queue,
            message_id = %message_id,
            body_length = payload.len(),
            "rabbitmq_record_published"
        );

        Ok(())
    }
}
