//! Stateful worker: drains inbound deliveries through per-conversation machines
//!
//! Deliveries are processed one at a time, to completion, in broker order.
//! The conversation store belongs to the loop alone.

use crate::broker::{
    cancel_subscription, next_or_stop, settle, AmqpBroker, Delivery, Disposition, QueueSink,
    StopReason, Subscription,
};
use crate::config::RelayConfig;
use crate::envelope::{ConversationKey, Envelope};
use crate::error::{BrokerResult, RouteError};
use crate::publisher::OutboundPublisher;
use crate::state_machine::{Event, Phrasebook};
use crate::store::ConversationStore;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Behavior knobs for the delivery loop
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    pub phrasebook: Phrasebook,
    /// Bot types this worker serves; `None` serves all
    pub allowed_bot_types: Option<HashSet<String>>,
    /// Evict conversations idle this long; `None` keeps them for the process lifetime
    pub idle_ttl: Option<Duration>,
}

impl From<&RelayConfig> for WorkerOptions {
    fn from(config: &RelayConfig) -> Self {
        Self {
            phrasebook: config.locale.phrasebook(),
            allowed_bot_types: config.allowed_bot_types.clone(),
            idle_ttl: config.idle_ttl,
        }
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub acknowledged: usize,
    pub rejected: usize,
    pub replies_published: usize,
    pub replies_dropped: usize,
    pub evicted: usize,
}

/// What [`DeliveryLoop::run`] ended with
#[derive(Debug)]
pub struct RunOutcome {
    pub stats: LoopStats,
    pub stop: StopReason,
}

/// Single-task orchestrator over the store, the machines and the publisher
pub struct DeliveryLoop<S> {
    store: ConversationStore,
    publisher: OutboundPublisher<S>,
    options: WorkerOptions,
    stats: LoopStats,
    last_sweep: Instant,
}

impl<S: QueueSink> DeliveryLoop<S> {
    pub fn new(publisher: OutboundPublisher<S>, options: WorkerOptions) -> Self {
        Self {
            store: ConversationStore::new(),
            publisher,
            options,
            stats: LoopStats::default(),
            last_sweep: Instant::now(),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Drain `subscription` until it closes, fails or `shutdown` fires.
    ///
    /// A delivery already taken when shutdown fires is finished and settled;
    /// no further deliveries are taken, then the subscription is cancelled.
    pub async fn run<Sub: Subscription>(
        &mut self,
        mut subscription: Sub,
        shutdown: CancellationToken,
    ) -> RunOutcome {
        tracing::info!(queue = %self.publisher.queue(), "Delivery loop started");

        let stop = loop {
            match next_or_stop(&mut subscription, &shutdown).await {
                Ok(delivery) => {
                    let disposition = self.handle_delivery(delivery.body()).await;
                    self.settle(&delivery, disposition).await;
                    self.sweep_idle();
                }
                Err(stop) => break stop,
            }
        };

        cancel_subscription(&mut subscription).await;

        tracing::info!(
            acknowledged = self.stats.acknowledged,
            rejected = self.stats.rejected,
            replies_published = self.stats.replies_published,
            replies_dropped = self.stats.replies_dropped,
            evicted = self.stats.evicted,
            conversations = self.store.len(),
            ?stop,
            "Delivery loop stopped"
        );
        RunOutcome {
            stats: self.stats,
            stop,
        }
    }

    /// Decode, route, step and publish; returns how to settle the delivery
    pub async fn handle_delivery(&mut self, body: &[u8]) -> Disposition {
        let envelope = match Envelope::from_slice(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %String::from_utf8_lossy(body),
                    "Malformed delivery, dropping"
                );
                return Disposition::Reject;
            }
        };

        tracing::debug!(
            bot_type = %envelope.bot_type,
            conversation_id = %envelope.conversation_id,
            "Received message"
        );

        let key = match self.route(&envelope) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "Unroutable delivery, dropping");
                return Disposition::Reject;
            }
        };

        let machine = self.store.get_or_create(&key);
        let old_state = machine.state;
        let result = machine.advance(&self.options.phrasebook, &Event::from(&envelope));
        if result.changed(old_state) {
            tracing::debug!(
                key = %key,
                from = %old_state,
                to = %result.new_state,
                "State changed"
            );
        }

        // State has committed; a lost reply does not roll it back
        for action in result.actions {
            let reply = Envelope::reply(&key, action.text());
            match self.publisher.publish(&reply).await {
                Ok(()) => self.stats.replies_published += 1,
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Reply dropped");
                    self.stats.replies_dropped += 1;
                }
            }
        }

        Disposition::Ack
    }

    fn route(&self, envelope: &Envelope) -> Result<ConversationKey, RouteError> {
        if envelope.conversation_id.is_empty() {
            return Err(RouteError::EmptyConversation {
                bot_type: envelope.bot_type.clone(),
            });
        }
        if let Some(allowed) = &self.options.allowed_bot_types {
            if !allowed.contains(&envelope.bot_type) {
                return Err(RouteError::BotTypeNotAllowed(envelope.bot_type.clone()));
            }
        }
        Ok(envelope.key())
    }

    async fn settle<D: Delivery>(&mut self, delivery: &D, disposition: Disposition) {
        if settle(delivery, disposition).await {
            match disposition {
                Disposition::Ack => self.stats.acknowledged += 1,
                Disposition::Reject => self.stats.rejected += 1,
            }
        }
    }

    /// Evict idle conversations at most once per TTL period
    fn sweep_idle(&mut self) {
        let Some(ttl) = self.options.idle_ttl else {
            return;
        };
        if self.last_sweep.elapsed() < ttl {
            return;
        }
        self.last_sweep = Instant::now();
        let evicted = self.store.evict_idle(ttl);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.store.len(), "Evicted idle conversations");
            self.stats.evicted += evicted;
        }
    }
}

/// Connect to the broker, run the delivery loop until `shutdown`, then close.
///
/// Connection and subscription failures are returned before any delivery is
/// taken. After that, per-delivery errors are handled inside the loop, and
/// the loop ending for any reason other than `shutdown` is returned as an
/// error.
pub async fn serve(config: &RelayConfig, shutdown: CancellationToken) -> BrokerResult<LoopStats> {
    let broker = AmqpBroker::connect(&config.amqp_dsn).await?;
    if config.declare_queues {
        broker.declare_queue(&config.inbound_queue).await?;
        broker.declare_queue(&config.outbound_queue).await?;
    }

    let subscription = broker
        .subscribe(&config.inbound_queue, &config.consumer_tag)
        .await?;
    let publisher = OutboundPublisher::new(broker.sink(), config.outbound_queue.clone());

    let mut delivery_loop = DeliveryLoop::new(publisher, WorkerOptions::from(config));
    let outcome = delivery_loop.run(subscription, shutdown).await;

    let closed = broker.close().await;
    if let Err(e) = &closed {
        tracing::warn!(error = %e, "Failed to close broker connections");
    }
    outcome.stop.into_result()?;
    closed?;
    Ok(outcome.stats)
}
