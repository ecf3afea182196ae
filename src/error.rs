//! Error types for the relay

use thiserror::Error;

/// Configuration could not be read from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Broker-level failure (connection, channel, consume, publish, ack)
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),
    #[error("Subscription closed")]
    Closed,
    #[error("Broker error: {0}")]
    Other(String),
}

impl BrokerError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Envelope could not be encoded or decoded
#[derive(Debug, Error)]
#[error("Envelope {op} failed: {source}")]
pub struct EnvelopeError {
    pub op: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// A decoded envelope cannot be delivered to a conversation or sink
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Envelope has no conversation id (bot_type {bot_type:?})")]
    EmptyConversation { bot_type: String },
    #[error("Bot type not served by this worker: {0:?}")]
    BotTypeNotAllowed(String),
    #[error("No reply sink registered for bot type {0:?}")]
    NoSink(String),
}

/// A single reply could not be published
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Encode(#[from] EnvelopeError),
    #[error("Publish to queue '{queue}' failed: {source}")]
    Broker {
        queue: String,
        #[source]
        source: BrokerError,
    },
}

/// A reply sink could not hand a reply to its platform
#[derive(Debug, Error)]
#[error("Reply sink '{sink}' failed: {message}")]
pub struct DispatchError {
    pub sink: String,
    pub message: String,
}

impl DispatchError {
    pub fn new(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
