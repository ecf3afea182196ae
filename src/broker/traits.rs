//! Trait abstractions for broker I/O
//!
//! These traits enable testing the delivery loops with mock implementations.

use crate::error::BrokerResult;
use async_trait::async_trait;
use std::sync::Arc;

/// One unit of work pulled from a subscription; must be settled exactly once
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Raw message body
    fn body(&self) -> &[u8];

    /// Confirm processing; the broker may discard the message
    async fn ack(&self) -> BrokerResult<()>;

    /// Discard the message without requeueing it
    async fn reject(&self) -> BrokerResult<()>;
}

/// Stream of deliveries from one queue consumer
#[async_trait]
pub trait Subscription: Send {
    type Item: Delivery;

    /// Wait for the next delivery; `None` once the subscription is closed
    async fn next_delivery(&mut self) -> Option<BrokerResult<Self::Item>>;

    /// Ask the broker to stop sending deliveries to this consumer
    async fn cancel(&mut self) -> BrokerResult<()>;
}

/// Fire-and-forget publishing to a named queue
#[async_trait]
pub trait QueueSink: Send + Sync {
    async fn send(&self, queue: &str, body: &[u8]) -> BrokerResult<()>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: QueueSink + ?Sized> QueueSink for Arc<T> {
    async fn send(&self, queue: &str, body: &[u8]) -> BrokerResult<()> {
        (**self).send(queue, body).await
    }
}
