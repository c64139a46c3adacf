//! Double-ended queue of pending timed actions owned by a single entity.

use std::{collections::VecDeque, time::Duration};

use tick_tactics_core::{Action, Offset};

/// Ordered list of pending actions; the head is the one being resolved.
#[derive(Clone, Debug, Default)]
pub(crate) struct ActionQueue {
    actions: VecDeque<Action>,
}

impl ActionQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_back(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    /// Places the action ahead of everything else, preempting the current head.
    pub(crate) fn push_front(&mut self, action: Action) {
        self.actions.push_front(action);
    }

    pub(crate) fn pop_back(&mut self) -> Option<Action> {
        self.actions.pop_back()
    }

    pub(crate) fn front(&self) -> Option<&Action> {
        self.actions.front()
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut Action> {
        self.actions.front_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.actions.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Pops the completed head and carries its overflow into the next action.
    pub(crate) fn complete_front(&mut self) -> Option<Action> {
        let finished = self.actions.pop_front()?;
        let overflow = finished.overflow();
        if let Some(next) = self.actions.front_mut() {
            next.advance(overflow);
        }
        Some(finished)
    }

    /// Net displacement of every pending relocation.
    pub(crate) fn pending_offset(&self) -> Offset {
        self.actions
            .iter()
            .filter_map(Action::relocation)
            .fold(Offset::ZERO, Offset::plus)
    }

    /// Time left until the queue drains if nothing stalls.
    pub(crate) fn remaining_time(&self) -> Duration {
        self.actions
            .iter()
            .fold(Duration::ZERO, |total, action| total.saturating_add(action.remaining()))
    }
}
