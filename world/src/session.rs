//! Win, loss and selection bookkeeping for a single level attempt.

use std::time::Duration;

use tick_tactics_core::{EntityId, Event, SessionSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct Session {
    coins_remaining: u32,
    game_over: bool,
    won: bool,
    win_elapsed: Duration,
    win_delay: Duration,
    level_finished: bool,
    paused: bool,
    level_time: Duration,
    selectable: Vec<Option<EntityId>>,
    selected: Option<EntityId>,
}

impl Session {
    pub(crate) fn new(selectable: Vec<Option<EntityId>>, coins: u32, win_delay: Duration) -> Self {
        let selected = selectable.iter().flatten().copied().next();
        Self {
            coins_remaining: coins,
            game_over: false,
            won: false,
            win_elapsed: Duration::ZERO,
            win_delay,
            level_finished: false,
            paused: false,
            level_time: Duration::ZERO,
            selectable,
            selected,
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn level_time(&self) -> Duration {
        self.level_time
    }

    pub(crate) fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub(crate) fn is_won(&self) -> bool {
        self.won
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub(crate) fn coins_remaining(&self) -> u32 {
        self.coins_remaining
    }

    pub(crate) fn advance_clock(&mut self, dt: Duration) {
        self.level_time = self.level_time.saturating_add(dt);
    }

    pub(crate) fn set_paused(&mut self, paused: bool, out_events: &mut Vec<Event>) {
        if self.paused != paused {
            self.paused = paused;
            out_events.push(Event::PauseChanged { paused });
        }
    }

    /// Selects the entity stored in the slot. Empty or missing slots are ignored.
    pub(crate) fn select_slot(&mut self, slot: usize, out_events: &mut Vec<Event>) {
        let Some(Some(entity)) = self.selectable.get(slot).copied() else {
            return;
        };
        if self.selected != Some(entity) {
            self.selected = Some(entity);
            out_events.push(Event::SelectionChanged {
                entity: Some(entity),
            });
        }
    }

    /// Records a coin leaving the level; the transition to zero wins it.
    pub(crate) fn coin_removed(&mut self, out_events: &mut Vec<Event>) {
        if self.coins_remaining == 0 {
            return;
        }
        self.coins_remaining -= 1;
        if self.coins_remaining == 0 && !self.won {
            self.won = true;
            tracing::debug!("last coin removed, win timer started");
            out_events.push(Event::LevelWon);
        }
    }

    /// Vacates the player's slot, keeping the roster size fixed.
    pub(crate) fn player_removed(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        let Some(slot) = self
            .selectable
            .iter_mut()
            .find(|slot| **slot == Some(entity))
        else {
            return;
        };
        *slot = None;

        if self.selected == Some(entity) {
            self.selected = self.selectable.iter().flatten().copied().next();
            out_events.push(Event::SelectionChanged {
                entity: self.selected,
            });
        }

        if self.selectable.iter().all(Option::is_none) && !self.game_over {
            self.game_over = true;
            tracing::debug!("every player slot is empty, game over");
            out_events.push(Event::GameOver);
        }
    }

    pub(crate) fn tick_win_timer(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.won || self.level_finished {
            return;
        }
        self.win_elapsed = self.win_elapsed.saturating_add(dt);
        if self.win_elapsed >= self.win_delay {
            self.level_finished = true;
            out_events.push(Event::LevelFinished);
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            coins_remaining: self.coins_remaining,
            game_over: self.game_over,
            won: self.won,
            level_finished: self.level_finished,
            paused: self.paused,
            level_time: self.level_time,
            selected: self.selected,
            selectable: self.selectable.clone(),
        }
    }
}
