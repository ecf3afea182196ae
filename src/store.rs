//! In-memory table of conversation state machines
//!
//! Owned by the worker's delivery loop; nothing else reads or writes it,
//! so there is no locking. Concurrent delivery processing would need a
//! per-key lock discipline here first.

use crate::envelope::ConversationKey;
use crate::state_machine::OrderMachine;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    machine: OrderMachine,
    last_seen: Instant,
}

/// Lazily populated map from conversation key to state machine.
///
/// Entries live for the whole process unless [`ConversationStore::evict_idle`]
/// is called; the worker only does so when an idle TTL is configured.
#[derive(Default)]
pub struct ConversationStore {
    entries: HashMap<ConversationKey, Entry>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the machine for `key`, creating it in its initial state if needed
    pub fn get_or_create(&mut self, key: &ConversationKey) -> &mut OrderMachine {
        let now = Instant::now();
        let entry = match self.entries.entry(key.clone()) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                tracing::debug!(
                    key = %key,
                    state = %entry.machine.state,
                    "Conversation found"
                );
                entry
            }
            std::collections::hash_map::Entry::Vacant(vacant) => {
                tracing::debug!(key = %key, "Conversation created");
                vacant.insert(Entry {
                    machine: OrderMachine::new(),
                    last_seen: now,
                })
            }
        };
        entry.last_seen = now;
        &mut entry.machine
    }

    pub fn get(&self, key: &ConversationKey) -> Option<&OrderMachine> {
        self.entries.get(key).map(|entry| &entry.machine)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop conversations untouched for longer than `max_idle`; returns how many
    pub fn evict_idle(&mut self, max_idle: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_seen.elapsed() <= max_idle);
        before - self.entries.len()
    }
}
