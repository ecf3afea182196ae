//! Message broker seam
//!
//! The delivery loops only see the traits in [`traits`]; [`amqp`] provides
//! the production implementation and `testing` the mocks.

mod amqp;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use amqp::{AmqpBroker, AmqpSink, AmqpSubscription};
pub use traits::*;

use crate::error::{BrokerError, BrokerResult};
use tokio_util::sync::CancellationToken;

/// Terminal decision for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processed; the broker may discard it
    Ack,
    /// Poison or unroutable; discarded without requeue
    Reject,
}

/// Why a delivery loop stopped taking deliveries
#[derive(Debug)]
pub enum StopReason {
    /// The shutdown token fired
    Requested,
    /// The broker ended the subscription
    Closed,
    /// Receiving failed
    Failed(BrokerError),
}

impl StopReason {
    /// `Ok` only for a requested stop; anything else is a failure the
    /// process should exit non-zero on
    pub fn into_result(self) -> BrokerResult<()> {
        match self {
            StopReason::Requested => Ok(()),
            StopReason::Closed => Err(BrokerError::Closed),
            StopReason::Failed(e) => Err(e),
        }
    }
}

/// Wait for the next delivery unless shutdown is requested first.
///
/// Returns the reason to stop instead: shutdown, a closed subscription,
/// or a receive error.
pub async fn next_or_stop<S: Subscription>(
    subscription: &mut S,
    shutdown: &CancellationToken,
) -> Result<S::Item, StopReason> {
    let next = tokio::select! {
        biased;

        () = shutdown.cancelled() => {
            tracing::info!("Stop requested, no further deliveries will be taken");
            return Err(StopReason::Requested);
        }

        next = subscription.next_delivery() => next,
    };

    match next {
        Some(Ok(delivery)) => Ok(delivery),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Subscription failed");
            Err(StopReason::Failed(e))
        }
        None => {
            tracing::warn!("Subscription closed by broker");
            Err(StopReason::Closed)
        }
    }
}

/// Acknowledge or reject a delivery; failures are logged, not propagated
pub async fn settle<D: Delivery>(delivery: &D, disposition: Disposition) -> bool {
    let result = match disposition {
        Disposition::Ack => delivery.ack().await,
        Disposition::Reject => delivery.reject().await,
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, ?disposition, "Failed to settle delivery");
    }
    result.is_ok()
}

/// Cancel a subscription after its loop has stopped taking deliveries
pub async fn cancel_subscription<S: Subscription>(subscription: &mut S) {
    if let Err(e) = subscription.cancel().await {
        tracing::warn!(error = %e, "Failed to cancel subscription");
    }
}
