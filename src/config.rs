//! Process configuration read from the environment

use crate::error::ConfigError;
use crate::state_machine::Locale;
use std::collections::HashSet;
use std::time::Duration;

pub const AMQP_DSN: &str = "AMQP_DSN";
pub const INBOUND_QUEUE: &str = "RELAY_INBOUND_QUEUE";
pub const OUTBOUND_QUEUE: &str = "RELAY_OUTBOUND_QUEUE";
pub const CONSUMER_TAG: &str = "RELAY_CONSUMER_TAG";
pub const LOCALE: &str = "RELAY_LOCALE";
pub const BOT_TYPES: &str = "RELAY_BOT_TYPES";
pub const IDLE_TTL_SECS: &str = "RELAY_IDLE_TTL_SECS";
pub const DECLARE_QUEUES: &str = "RELAY_DECLARE_QUEUES";

const DEFAULT_INBOUND_QUEUE: &str = "queue1";
const DEFAULT_OUTBOUND_QUEUE: &str = "queue2";

/// Broker and worker settings shared by the worker and gateway binaries.
///
/// Queue names are from the worker's point of view: the worker consumes
/// `inbound_queue` and publishes to `outbound_queue`; a gateway does the
/// opposite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub amqp_dsn: String,
    pub inbound_queue: String,
    pub outbound_queue: String,
    pub consumer_tag: String,
    pub locale: Locale,
    /// Bot types the worker serves; `None` serves every bot type
    pub allowed_bot_types: Option<HashSet<String>>,
    /// Evict conversations idle this long; `None` keeps them forever
    pub idle_ttl: Option<Duration>,
    pub declare_queues: bool,
}

impl RelayConfig {
    pub fn from_env(default_consumer_tag: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(default_consumer_tag, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        default_consumer_tag: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Unset and blank are treated alike
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let amqp_dsn = var(AMQP_DSN).ok_or(ConfigError::Missing(AMQP_DSN))?;

        let locale = match var(LOCALE) {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                name: LOCALE,
                value,
                reason,
            })?,
            None => Locale::default(),
        };

        let allowed_bot_types = var(BOT_TYPES).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<HashSet<_>>()
        });

        let idle_ttl = match var(IDLE_TTL_SECS) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: IDLE_TTL_SECS,
                        value,
                        reason: e.to_string(),
                    })
                }
            },
            None => None,
        };

        let declare_queues = match var(DECLARE_QUEUES) {
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
                name: DECLARE_QUEUES,
                value: value.clone(),
                reason: "expected true or false".to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            amqp_dsn,
            inbound_queue: var(INBOUND_QUEUE).unwrap_or_else(|| DEFAULT_INBOUND_QUEUE.to_string()),
            outbound_queue: var(OUTBOUND_QUEUE)
                .unwrap_or_else(|| DEFAULT_OUTBOUND_QUEUE.to_string()),
            consumer_tag: var(CONSUMER_TAG).unwrap_or_else(|| default_consumer_tag.to_string()),
            locale,
            allowed_bot_types,
            idle_ttl,
            declare_queues,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
