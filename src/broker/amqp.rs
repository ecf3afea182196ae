//! AMQP 0-9-1 implementation of the broker traits (RabbitMQ via `lapin`)

use super::traits::{Delivery, QueueSink, Subscription};
use crate::error::BrokerResult;
use async_trait::async_trait;
use futures::StreamExt;
use lapin::message::Delivery as AmqpDelivery;
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions,
    BasicPublishOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer};

/// Reply code for a normal connection close
const REPLY_SUCCESS: u16 = 200;

/// Broker handle with separate connections for consuming and publishing
pub struct AmqpBroker {
    consume_conn: Connection,
    publish_conn: Connection,
    consume_channel: Channel,
    publish_channel: Channel,
}

impl AmqpBroker {
    /// Dial the broker twice and open one channel on each connection
    pub async fn connect(dsn: &str) -> BrokerResult<Self> {
        let publish_conn = Connection::connect(dsn, ConnectionProperties::default()).await?;
        let consume_conn = Connection::connect(dsn, ConnectionProperties::default()).await?;
        tracing::info!("Connected to broker");

        let consume_channel = consume_conn.create_channel().await?;
        let publish_channel = publish_conn.create_channel().await?;
        tracing::debug!(
            consume_channel = consume_channel.id(),
            publish_channel = publish_channel.id(),
            "Channels opened"
        );

        Ok(Self {
            consume_conn,
            publish_conn,
            consume_channel,
            publish_channel,
        })
    }

    /// Declare a queue with default (non-durable) properties
    pub async fn declare_queue(&self, name: &str) -> BrokerResult<()> {
        let queue = self
            .consume_channel
            .queue_declare(name, QueueDeclareOptions::default(), FieldTable::default())
            .await?;
        tracing::info!(queue = %name, messages = queue.message_count(), "Queue declared");
        Ok(())
    }

    /// Start consuming `queue`: manual ack, non-exclusive, no extra arguments
    pub async fn subscribe(&self, queue: &str, consumer_tag: &str) -> BrokerResult<AmqpSubscription> {
        let consumer = self
            .consume_channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_local: false,
                    no_ack: false,
                    exclusive: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await?;
        tracing::info!(queue = %queue, consumer_tag = %consumer_tag, "Subscribed");

        Ok(AmqpSubscription {
            consumer,
            channel: self.consume_channel.clone(),
            consumer_tag: consumer_tag.to_string(),
        })
    }

    /// Publisher bound to the publishing channel
    pub fn sink(&self) -> AmqpSink {
        AmqpSink {
            channel: self.publish_channel.clone(),
        }
    }

    /// Close both connections, consumer side first
    pub async fn close(self) -> BrokerResult<()> {
        self.consume_conn.close(REPLY_SUCCESS, "shutdown").await?;
        self.publish_conn.close(REPLY_SUCCESS, "shutdown").await?;
        tracing::info!("Broker connections closed");
        Ok(())
    }
}

/// Active consumer on the consuming channel
pub struct AmqpSubscription {
    consumer: Consumer,
    channel: Channel,
    consumer_tag: String,
}

#[async_trait]
impl Subscription for AmqpSubscription {
    type Item = AmqpDelivery;

    async fn next_delivery(&mut self) -> Option<BrokerResult<AmqpDelivery>> {
        self.consumer
            .next()
            .await
            .map(|result| result.map_err(Into::into))
    }

    async fn cancel(&mut self) -> BrokerResult<()> {
        self.channel
            .basic_cancel(&self.consumer_tag, BasicCancelOptions::default())
            .await?;
        tracing::info!(consumer_tag = %self.consumer_tag, "Subscription cancelled");
        Ok(())
    }
}

#[async_trait]
impl Delivery for AmqpDelivery {
    fn body(&self) -> &[u8] {
        &self.data
    }

    async fn ack(&self) -> BrokerResult<()> {
        self.acker.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn reject(&self) -> BrokerResult<()> {
        self.acker
            .nack(BasicNackOptions {
                multiple: false,
                requeue: false,
            })
            .await?;
        Ok(())
    }
}

/// Publishes through the default exchange, routing key = queue name
#[derive(Clone)]
pub struct AmqpSink {
    channel: Channel,
}

#[async_trait]
impl QueueSink for AmqpSink {
    async fn send(&self, queue: &str, body: &[u8]) -> BrokerResult<()> {
        // The returned confirm is not awaited: publishing is fire-and-forget
        let _confirm = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default(),
            )
            .await?;
        Ok(())
    }
}
