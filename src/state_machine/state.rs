//! Order conversation state types

use super::{transition, Action, Event, Phrasebook, TransitionResult};
use std::fmt;

/// Where a conversation is in the ordering dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderState {
    /// Idle, waiting for the start command
    #[default]
    WaitForStart,
    WaitForSize,
    WaitForPaymentType,
    WaitForApprove,
    /// Terminal state reserved for a finished order. Never entered: an
    /// approved order loops back to `WaitForStart`.
    Finish,
}

impl OrderState {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::WaitForStart => "WaitForStart",
            OrderState::WaitForSize => "WaitForSize",
            OrderState::WaitForPaymentType => "WaitForPaymentType",
            OrderState::WaitForApprove => "WaitForApprove",
            OrderState::Finish => "Finish",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choices captured across transitions (lowercased user input)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selections {
    pub size: Option<String>,
    pub payment: Option<String>,
}

/// One conversation's state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderMachine {
    pub state: OrderState,
    pub selections: Selections,
}

impl OrderMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the actions to effect, in order.
    ///
    /// Never fails: unrecognized input leaves the machine untouched.
    pub fn step(&mut self, phrasebook: &Phrasebook, event: &Event) -> Vec<Action> {
        self.advance(phrasebook, event).actions
    }

    /// Apply one event and return the full transition result
    pub fn advance(&mut self, phrasebook: &Phrasebook, event: &Event) -> TransitionResult {
        let result = transition(self.state, &self.selections, phrasebook, event);
        self.state = result.new_state;
        self.selections.clone_from(&result.selections);
        result
    }
}
