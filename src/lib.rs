//! Order relay - stateful chat worker behind a message broker
//!
//! Consumes conversation events from an inbound queue, drives one order
//! state machine per conversation and publishes replies to an outbound
//! queue.

pub mod broker;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod publisher;
pub mod shutdown;
pub mod state_machine;
pub mod store;
pub mod worker;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the JSON log subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
