//! Events fed into the order state machine

use crate::envelope::Envelope;

/// User input for one step of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    /// Parsed bot command without the leading slash, empty if none
    pub command: String,
    /// Raw message text
    pub text: String,
}

impl Event {
    pub fn new(command: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
        }
    }

    pub fn command(command: impl Into<String>) -> Self {
        Self::new(command, String::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }
}

impl From<&Envelope> for Event {
    fn from(envelope: &Envelope) -> Self {
        Self::new(envelope.command.clone(), envelope.text.clone())
    }
}
