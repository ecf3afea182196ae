//! Pure state transition function

use super::{Action, Event, OrderState, Phrasebook, Selections};

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: OrderState,
    pub selections: Selections,
    pub actions: Vec<Action>,
}

impl TransitionResult {
    pub fn new(state: OrderState, selections: Selections) -> Self {
        Self {
            new_state: state,
            selections,
            actions: vec![],
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether this result moves the machine out of `from`
    pub fn changed(&self, from: OrderState) -> bool {
        self.new_state != from
    }
}

/// Pure transition function.
///
/// Total over every (state, selections, event): input the current state does
/// not recognize yields the unchanged state and no actions.
pub fn transition(
    state: OrderState,
    selections: &Selections,
    phrasebook: &Phrasebook,
    event: &Event,
) -> TransitionResult {
    let unchanged = || TransitionResult::new(state, selections.clone());

    match state {
        OrderState::WaitForStart => {
            if event.command == phrasebook.start_command {
                TransitionResult::new(OrderState::WaitForSize, selections.clone())
                    .with_action(Action::reply(phrasebook.ask_size))
            } else {
                unchanged()
            }
        }

        OrderState::WaitForSize => {
            let word = event.text.to_lowercase();
            if phrasebook.is_size(&word) {
                let selections = Selections {
                    size: Some(word),
                    ..selections.clone()
                };
                TransitionResult::new(OrderState::WaitForPaymentType, selections)
                    .with_action(Action::reply(phrasebook.ask_payment))
            } else {
                // TODO: reply with the accepted sizes once product decides on error prompts
                unchanged()
            }
        }

        OrderState::WaitForPaymentType => {
            let word = event.text.to_lowercase();
            if phrasebook.is_payment_method(&word) {
                let size = selections.size.as_deref().unwrap_or_default();
                let prompt = phrasebook.confirm(size, &word);
                let selections = Selections {
                    payment: Some(word),
                    ..selections.clone()
                };
                TransitionResult::new(OrderState::WaitForApprove, selections)
                    .with_action(Action::reply(prompt))
            } else {
                unchanged()
            }
        }

        OrderState::WaitForApprove => {
            if event.text.to_lowercase() == phrasebook.approval {
                // Loops back instead of entering Finish so the user can order again
                TransitionResult::new(OrderState::WaitForStart, selections.clone())
                    .with_action(Action::reply(phrasebook.thank_you))
            } else {
                unchanged()
            }
        }

        OrderState::Finish => unchanged(),
    }
}
