//! Serializes envelopes and publishes them to a configured queue

use crate::broker::QueueSink;
use crate::envelope::Envelope;
use crate::error::PublishError;

/// Publishes envelopes to one queue.
///
/// No broker confirm is awaited; errors are returned so the caller can log
/// and drop the single message.
pub struct OutboundPublisher<S> {
    sink: S,
    queue: String,
}

impl<S: QueueSink> OutboundPublisher<S> {
    pub fn new(sink: S, queue: impl Into<String>) -> Self {
        Self {
            sink,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub async fn publish(&self, envelope: &Envelope) -> Result<(), PublishError> {
        let body = envelope.to_vec()?;

        tracing::debug!(
            queue = %self.queue,
            bot_type = %envelope.bot_type,
            conversation_id = %envelope.conversation_id,
            "Publishing envelope"
        );

        self.sink
            .send(&self.queue, &body)
            .await
            .map_err(|source| PublishError::Broker {
                queue: self.queue.clone(),
                source,
            })
    }
}
