//! Gateway-side reply dispatch
//!
//! Consumes the worker's replies and hands each one to the sink registered
//! for its bot type. Platform adapters implement [`ReplySink`].

use crate::broker::{
    cancel_subscription, next_or_stop, settle, Delivery, Disposition, Subscription,
};
use crate::envelope::Envelope;
use crate::error::{DispatchError, RouteError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Destination for replies of one bot type (a chat platform client)
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, reply: &Envelope) -> Result<(), DispatchError>;
}

/// Counters reported when the router stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub rejected: usize,
}

/// Registry of reply sinks keyed by bot type
#[derive(Default)]
pub struct ReplyRouter {
    sinks: HashMap<String, Arc<dyn ReplySink>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for `bot_type`, replacing any previous one
    pub fn register(&mut self, bot_type: impl Into<String>, sink: Arc<dyn ReplySink>) {
        self.sinks.insert(bot_type.into(), sink);
    }

    /// Decode one delivery body and hand it to its sink
    pub async fn dispatch(&self, body: &[u8]) -> Disposition {
        let reply = match Envelope::from_slice(body) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %String::from_utf8_lossy(body),
                    "Malformed reply, dropping"
                );
                return Disposition::Reject;
            }
        };

        let Some(sink) = self.sinks.get(&reply.bot_type) else {
            let e = RouteError::NoSink(reply.bot_type.clone());
            tracing::warn!(error = %e, "Unroutable reply, dropping");
            return Disposition::Reject;
        };

        match sink.deliver(&reply).await {
            Ok(()) => {
                tracing::debug!(
                    bot_type = %reply.bot_type,
                    conversation_id = %reply.conversation_id,
                    "Reply delivered"
                );
                Disposition::Ack
            }
            Err(e) => {
                tracing::error!(error = %e, "Reply delivery failed");
                Disposition::Reject
            }
        }
    }

    /// Drain `subscription` until it closes or `shutdown` fires
    pub async fn run<Sub: Subscription>(
        &self,
        mut subscription: Sub,
        shutdown: CancellationToken,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Ok(delivery) = next_or_stop(&mut subscription, &shutdown).await {
            let disposition = self.dispatch(delivery.body()).await;
            if settle(&delivery, disposition).await {
                match disposition {
                    Disposition::Ack => stats.delivered += 1,
                    Disposition::Reject => stats.rejected += 1,
                }
            }
        }

        cancel_subscription(&mut subscription).await;
        tracing::info!(
            delivered = stats.delivered,
            rejected = stats.rejected,
            "Reply router stopped"
        );
        stats
    }
}

/// Bot command carried by a chat message, without the slash.
///
/// `"/start@order_bot now"` yields `"start"`; text not starting with `/`
/// yields `""`.
pub fn command_of(text: &str) -> &str {
    let Some(rest) = text.strip_prefix('/') else {
        return "";
    };
    let word = rest.split(char::is_whitespace).next().unwrap_or_default();
    word.split('@').next().unwrap_or_default()
}
