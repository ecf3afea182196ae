//! Property-based tests for the order state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_phrasebook() -> impl Strategy<Value = Phrasebook> {
    prop_oneof![Just(Phrasebook::ENGLISH), Just(Phrasebook::RUSSIAN)]
}

fn arb_state() -> impl Strategy<Value = OrderState> {
    prop_oneof![
        Just(OrderState::WaitForStart),
        Just(OrderState::WaitForSize),
        Just(OrderState::WaitForPaymentType),
        Just(OrderState::WaitForApprove),
        Just(OrderState::Finish),
    ]
}

fn arb_choice() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z]{1,10}")
}

fn arb_selections() -> impl Strategy<Value = Selections> {
    (arb_choice(), arb_choice()).prop_map(|(size, payment)| Selections { size, payment })
}

/// Mix of words the machine knows and arbitrary text
fn arb_word() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("start".to_string()),
        Just("large".to_string()),
        Just("Small".to_string()),
        Just("CASH".to_string()),
        Just("card".to_string()),
        Just("yes".to_string()),
        Just("большую".to_string()),
        Just("Картой".to_string()),
        Just("да".to_string()),
        Just(String::new()),
        any::<String>(),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    (arb_word(), arb_word()).prop_map(|(command, text)| Event { command, text })
}

/// Text no built-in phrasebook recognizes in any state
fn arb_unrecognized_text() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,20}".prop_filter("must not be a known word", |text| {
        [Phrasebook::ENGLISH, Phrasebook::RUSSIAN].iter().all(|book| {
            !book.is_size(text) && !book.is_payment_method(text) && text != book.approval
        })
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Same inputs always give the same outputs
    #[test]
    fn prop_transition_is_deterministic(
        state in arb_state(),
        selections in arb_selections(),
        book in arb_phrasebook(),
        event in arb_event(),
    ) {
        let first = transition(state, &selections, &book, &event);
        let second = transition(state, &selections, &book, &event);
        prop_assert_eq!(first, second);
    }

    // Any event sequence is accepted; at most one reply per step
    #[test]
    fn prop_any_sequence_is_accepted(
        book in arb_phrasebook(),
        events in proptest::collection::vec(arb_event(), 0..30),
    ) {
        let mut machine = OrderMachine::new();
        for event in events {
            let actions = machine.step(&book, &event);
            prop_assert!(actions.len() <= 1);
            prop_assert_ne!(machine.state, OrderState::Finish);
        }
    }

    // Unrecognized input in a waiting state is a no-op
    #[test]
    fn prop_unrecognized_input_is_noop(
        state in prop_oneof![
            Just(OrderState::WaitForSize),
            Just(OrderState::WaitForPaymentType),
            Just(OrderState::WaitForApprove),
        ],
        selections in arb_selections(),
        book in arb_phrasebook(),
        command in arb_word(),
        text in arb_unrecognized_text(),
    ) {
        let result = transition(state, &selections, &book, &Event { command, text });
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.selections, selections);
        prop_assert!(result.actions.is_empty());
    }

    // A reply is emitted exactly when the state changes
    #[test]
    fn prop_reply_iff_state_changes(
        state in arb_state(),
        selections in arb_selections(),
        book in arb_phrasebook(),
        event in arb_event(),
    ) {
        let result = transition(state, &selections, &book, &event);
        prop_assert_eq!(result.actions.is_empty(), result.new_state == state);
    }

    // Captured selections are always recognized words of the active phrasebook
    #[test]
    fn prop_selections_are_recognized_words(
        book in arb_phrasebook(),
        events in proptest::collection::vec(arb_event(), 0..30),
    ) {
        let mut machine = OrderMachine::new();
        for event in events {
            machine.step(&book, &event);
            if let Some(size) = &machine.selections.size {
                prop_assert!(book.is_size(size));
            }
            if let Some(payment) = &machine.selections.payment {
                prop_assert!(book.is_payment_method(payment));
            }
        }
    }

    // Approval always returns to the start and says thank you
    #[test]
    fn prop_approval_loops_back(
        selections in arb_selections(),
        book in arb_phrasebook(),
    ) {
        let event = Event::text(book.approval.to_uppercase());
        let result = transition(OrderState::WaitForApprove, &selections, &book, &event);
        prop_assert_eq!(result.new_state, OrderState::WaitForStart);
        prop_assert_eq!(result.actions, vec![Action::reply(book.thank_you)]);
    }
}
