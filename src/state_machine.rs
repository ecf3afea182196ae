//! Per-conversation order state machine
//!
//! Transitions are pure: the machine decides, the worker effects.

mod effect;
pub mod event;
mod phrasebook;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Action;
pub use event::Event;
pub use phrasebook::{Locale, Phrasebook};
pub use state::{OrderMachine, OrderState, Selections};
pub use transition::{transition, TransitionResult};
