//! Actions produced by state transitions

/// Output of a transition, executed by the worker after the state commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send text back to the conversation that produced the event
    Reply { text: String },
}

impl Action {
    pub fn reply(text: impl Into<String>) -> Self {
        Action::Reply { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Action::Reply { text } => text,
        }
    }
}
