//! Wire envelope shared by the gateway and worker tiers

use crate::error::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical message exchanged over the broker, in both directions.
///
/// All four fields must be present on the wire, though any may be empty.
/// Unknown fields are ignored. The field names used by the first gateway
/// generation (`BotType`, `ChatId`, `Text`, `Command`) are read as a
/// fallback when the snake_case field is absent, and never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope")]
pub struct Envelope {
    pub bot_type: String,
    pub conversation_id: String,
    pub text: String,
    pub command: String,
}

/// Read-side shape: canonical and legacy names kept apart so a body
/// carrying both never collides
#[derive(Deserialize)]
struct WireEnvelope {
    bot_type: Option<String>,
    conversation_id: Option<String>,
    text: Option<String>,
    command: Option<String>,
    #[serde(rename = "BotType")]
    legacy_bot_type: Option<String>,
    #[serde(rename = "ChatId")]
    legacy_chat_id: Option<String>,
    #[serde(rename = "Text")]
    legacy_text: Option<String>,
    #[serde(rename = "Command")]
    legacy_command: Option<String>,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = String;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        fn pick(
            name: &str,
            canonical: Option<String>,
            legacy: Option<String>,
        ) -> Result<String, String> {
            canonical
                .or(legacy)
                .ok_or_else(|| format!("missing field `{name}`"))
        }

        Ok(Self {
            bot_type: pick("bot_type", wire.bot_type, wire.legacy_bot_type)?,
            conversation_id: pick(
                "conversation_id",
                wire.conversation_id,
                wire.legacy_chat_id,
            )?,
            text: pick("text", wire.text, wire.legacy_text)?,
            command: pick("command", wire.command, wire.legacy_command)?,
        })
    }
}

impl Envelope {
    pub fn new(
        bot_type: impl Into<String>,
        conversation_id: impl Into<String>,
        text: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            bot_type: bot_type.into(),
            conversation_id: conversation_id.into(),
            text: text.into(),
            command: command.into(),
        }
    }

    /// Reply addressed to the conversation identified by `key`
    pub fn reply(key: &ConversationKey, text: impl Into<String>) -> Self {
        Self::new(
            key.bot_type.clone(),
            key.conversation_id.clone(),
            text,
            String::new(),
        )
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(self.bot_type.clone(), self.conversation_id.clone())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(|source| EnvelopeError {
            op: "decode",
            source,
        })
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(|source| EnvelopeError {
            op: "encode",
            source,
        })
    }
}

/// Identifies one conversation's state machine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    pub bot_type: String,
    pub conversation_id: String,
}

impl ConversationKey {
    pub fn new(bot_type: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            bot_type: bot_type.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bot_type, self.conversation_id)
    }
}
