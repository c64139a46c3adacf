#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that sequences level attempts.
//!
//! The world reports wins and losses through events but never decides what
//! happens next. The campaign consumes those events and tells the driver
//! which level to build a fresh world for.

use tick_tactics_core::Event;

/// Scene change requested by the campaign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Rebuild the provided level from scratch.
    Restart {
        /// Zero-based index of the level to restart.
        level: usize,
    },
    /// Move on to the provided level.
    Advance {
        /// Zero-based index of the next level.
        level: usize,
    },
    /// Every level has been finished.
    Completed,
}

/// Tracks progress through an ordered list of levels.
#[derive(Clone, Debug)]
pub struct Campaign {
    level_count: usize,
    current: usize,
    completed: bool,
}

impl Campaign {
    /// Creates a campaign starting at the first of `level_count` levels.
    #[must_use]
    pub const fn new(level_count: usize) -> Self {
        Self {
            level_count,
            current: 0,
            completed: level_count == 0,
        }
    }

    /// Zero-based index of the level being played.
    #[must_use]
    pub const fn current_level(&self) -> usize {
        self.current
    }

    /// Reports whether the last level has been finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Consumes world events and reports the first scene change they imply.
    ///
    /// Events after the first `LevelFinished` or `GameOver` belong to a world
    /// that is about to be discarded and are ignored.
    pub fn handle(&mut self, events: &[Event]) -> Option<Transition> {
        if self.completed {
            return None;
        }

        events.iter().find_map(|event| match event {
            Event::LevelFinished => Some(self.advance()),
            Event::GameOver => Some(self.request_restart()),
            _ => None,
        })
    }

    /// Restart requested by the player or triggered by a loss.
    #[must_use]
    pub const fn request_restart(&self) -> Transition {
        Transition::Restart {
            level: self.current,
        }
    }

    fn advance(&mut self) -> Transition {
        if self.current + 1 < self.level_count {
            self.current += 1;
            Transition::Advance {
                level: self.current,
            }
        } else {
            self.completed = true;
            Transition::Completed
        }
    }
}
