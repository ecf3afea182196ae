//! Mock implementations for testing
//!
//! These mocks enable delivery-loop testing without a running broker.

use super::traits::{Delivery, QueueSink, Subscription};
use super::Disposition;
use crate::envelope::Envelope;
use crate::error::{BrokerError, BrokerResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Settlement Log
// ============================================================================

/// Shared record of how each delivery was settled, by delivery index
#[derive(Clone, Default)]
pub struct SettlementLog(Arc<Mutex<Vec<(usize, Disposition)>>>);

impl SettlementLog {
    pub fn entries(&self) -> Vec<(usize, Disposition)> {
        self.0.lock().unwrap().clone()
    }

    pub fn dispositions(&self) -> Vec<Disposition> {
        self.entries().into_iter().map(|(_, d)| d).collect()
    }

    fn record(&self, index: usize, disposition: Disposition) {
        self.0.lock().unwrap().push((index, disposition));
    }
}

// ============================================================================
// Mock Delivery
// ============================================================================

pub struct MockDelivery {
    index: usize,
    body: Vec<u8>,
    log: SettlementLog,
    fail_settle: bool,
}

#[async_trait]
impl Delivery for MockDelivery {
    fn body(&self) -> &[u8] {
        &self.body
    }

    async fn ack(&self) -> BrokerResult<()> {
        if self.fail_settle {
            return Err(BrokerError::other("channel closed"));
        }
        self.log.record(self.index, Disposition::Ack);
        Ok(())
    }

    async fn reject(&self) -> BrokerResult<()> {
        if self.fail_settle {
            return Err(BrokerError::other("channel closed"));
        }
        self.log.record(self.index, Disposition::Reject);
        Ok(())
    }
}

// ============================================================================
// Mock Subscription
// ============================================================================

/// Subscription that hands out queued bodies in order
pub struct MockSubscription {
    pending: VecDeque<Vec<u8>>,
    next_index: usize,
    log: SettlementLog,
    cancelled: Arc<AtomicBool>,
    taken: Arc<AtomicUsize>,
    /// Stay open (pending forever) once the queue drains, like a live consumer
    hold_open: bool,
    /// Cancel this token after the given number of deliveries were taken
    stop_after: Option<(usize, CancellationToken)>,
    fail_settle: bool,
    error_after_drain: bool,
}

impl MockSubscription {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            next_index: 0,
            log: SettlementLog::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
            taken: Arc::new(AtomicUsize::new(0)),
            hold_open: false,
            stop_after: None,
            fail_settle: false,
            error_after_drain: false,
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.pending.push_back(body.into());
        self
    }

    pub fn with_envelope(self, envelope: &Envelope) -> Self {
        let body = envelope.to_vec().unwrap();
        self.with_body(body)
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn stop_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.stop_after = Some((count, token));
        self
    }

    pub fn failing_settle(mut self) -> Self {
        self.fail_settle = true;
        self
    }

    pub fn error_after_drain(mut self) -> Self {
        self.error_after_drain = true;
        self
    }

    pub fn settlements(&self) -> SettlementLog {
        self.log.clone()
    }

    pub fn cancelled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn taken_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.taken)
    }
}

impl Default for MockSubscription {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscription for MockSubscription {
    type Item = MockDelivery;

    async fn next_delivery(&mut self) -> Option<BrokerResult<MockDelivery>> {
        if let Some((count, token)) = &self.stop_after {
            if self.taken.load(Ordering::SeqCst) >= *count {
                token.cancel();
            }
        }

        let Some(body) = self.pending.pop_front() else {
            if self.error_after_drain {
                return Some(Err(BrokerError::other("connection reset")));
            }
            if self.hold_open {
                std::future::pending::<()>().await;
            }
            return None;
        };

        let index = self.next_index;
        self.next_index += 1;
        self.taken.fetch_add(1, Ordering::SeqCst);
        Some(Ok(MockDelivery {
            index,
            body,
            log: self.log.clone(),
            fail_settle: self.fail_settle,
        }))
    }

    async fn cancel(&mut self) -> BrokerResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Mock Queue Sink
// ============================================================================

/// Sink that records published bodies; can be told to fail selected sends
#[derive(Default)]
pub struct MockSink {
    sent: Mutex<Vec<(String, Vec<u8>)>>,
    attempts: AtomicUsize,
    fail_all: bool,
    fail_attempts: Vec<usize>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Sends with these zero-based attempt numbers fail
    pub fn failing_attempts(attempts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_attempts: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    /// Decoded envelopes, in publish order
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.sent()
            .iter()
            .map(|(_, body)| Envelope::from_slice(body).unwrap())
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.envelopes().into_iter().map(|e| e.text).collect()
    }
}

#[async_trait]
impl QueueSink for MockSink {
    async fn send(&self, queue: &str, body: &[u8]) -> BrokerResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.fail_attempts.contains(&attempt) {
            return Err(BrokerError::other("publish channel closed"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((queue.to_string(), body.to_vec()));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_subscription_hands_out_in_order() {
        let mut sub = MockSubscription::new().with_body("a").with_body("b");
        let log = sub.settlements();

        let first = sub.next_delivery().await.unwrap().unwrap();
        let second = sub.next_delivery().await.unwrap().unwrap();
        assert_eq!(first.body(), b"a");
        assert_eq!(second.body(), b"b");
        assert!(sub.next_delivery().await.is_none());

        second.reject().await.unwrap();
        first.ack().await.unwrap();
        assert_eq!(
            log.entries(),
            vec![(1, Disposition::Reject), (0, Disposition::Ack)]
        );
    }

    #[tokio::test]
    async fn test_mock_sink_failures() {
        let sink = MockSink::failing_attempts([1]);
        assert!(sink.send("q", b"1").await.is_ok());
        assert!(sink.send("q", b"2").await.is_err());
        assert!(sink.send("q", b"3").await.is_ok());
        assert_eq!(sink.sent().len(), 2);
    }
}
