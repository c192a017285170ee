// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use tracing::trace;

use crate::timeline::action::Action;

/// Receives every dispatched action and decides on its own whether to react
pub trait ActionListener: Send + Sync {
    fn on_action(&self, action: &Action);
}

impl<F> ActionListener for F
where
    F: Fn(&Action) + Send + Sync,
{
    fn on_action(&self, action: &Action) {
        self(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out of timeline actions to every registered listener, in registration order.
/// No listener can claim an action or stop its delivery to the others.
#[derive(Default)]
pub struct ActionDispatcher {
    listeners: Vec<(ListenerId, Arc<dyn ActionListener>)>,
    next_id: u64,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn ActionListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns whether a listener was removed
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `action` to all listeners; returns how many were invoked
    pub fn dispatch(&self, action: &Action) -> usize {
        trace!(kind = ?action.kind, listeners = self.listeners.len(), "Dispatching timeline action");
        for (_, listener) in &self.listeners {
            listener.on_action(action);
        }
        self.listeners.len()
    }
}
