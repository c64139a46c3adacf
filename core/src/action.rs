//! Timed actions queued on entities.

use std::{fmt, rc::Rc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Offset;

/// Closed set of timed behaviours an entity can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// One-tile relocation driven by the entity itself.
    Move,
    /// Shove applied to every entity in the neighbouring cell.
    Pushing,
    /// One-tile relocation forced by another entity's push.
    Pushed,
    /// Spike warming up before it rises.
    SpikePrep,
    /// Spike raised; entering this phase kills the cell's occupants.
    SpikeUp,
    /// Spike resting between cycles.
    SpikeIdle,
    /// Spike retracting.
    SpikeDown,
    /// Cannon waiting to fire.
    CannonIdle,
    /// Cannon firing; entering this phase spawns a fireball.
    CannonFire,
    /// Full-size explosion ending with removal.
    Explode,
    /// Small explosion used by fireballs, ending with removal.
    ExplodeSmall,
    /// Tutorial step waiting on its completion predicate.
    TutorialStep,
}

impl ActionKind {
    /// Reports whether the action relocates its entity when it completes.
    #[must_use]
    pub const fn is_relocation(self) -> bool {
        matches!(self, Self::Move | Self::Pushed)
    }

    /// Reports whether the action ends with the entity being removed.
    #[must_use]
    pub const fn is_explosion(self) -> bool {
        matches!(self, Self::Explode | Self::ExplodeSmall)
    }
}

/// Kind-specific data carried by an [`Action`].
#[derive(Clone, Debug, PartialEq)]
enum ActionPayload {
    /// Pure timer without extra data.
    Timer,
    /// Cell displacement used by moves and pushes.
    Offset(Offset),
    /// Tutorial step shown while the action is at the head of the queue.
    Tutorial(TutorialStep),
}

/// One timed, kind-tagged unit of behaviour queued on an entity.
///
/// `elapsed` may exceed `duration`; the surplus is carried into the next
/// queued action when this one completes.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    kind: ActionKind,
    elapsed: Duration,
    duration: Duration,
    payload: ActionPayload,
}

impl Action {
    /// Creates a payload-free action lasting the provided duration.
    #[must_use]
    pub const fn timer(kind: ActionKind, duration: Duration) -> Self {
        Self {
            kind,
            elapsed: Duration::ZERO,
            duration,
            payload: ActionPayload::Timer,
        }
    }

    /// Creates a one-tile move.
    #[must_use]
    pub const fn movement(offset: Offset, duration: Duration) -> Self {
        Self::directed(ActionKind::Move, offset, duration)
    }

    /// Creates a push towards the neighbouring cell at `offset`.
    #[must_use]
    pub const fn pushing(offset: Offset, duration: Duration) -> Self {
        Self::directed(ActionKind::Pushing, offset, duration)
    }

    /// Creates the forced relocation applied to a pushed entity.
    #[must_use]
    pub const fn pushed(offset: Offset, duration: Duration) -> Self {
        Self::directed(ActionKind::Pushed, offset, duration)
    }

    /// Creates a tutorial step. Tutorial steps complete through their
    /// predicate, never through time.
    #[must_use]
    pub fn tutorial(step: TutorialStep) -> Self {
        Self {
            kind: ActionKind::TutorialStep,
            elapsed: Duration::ZERO,
            duration: Duration::ZERO,
            payload: ActionPayload::Tutorial(step),
        }
    }

    const fn directed(kind: ActionKind, offset: Offset, duration: Duration) -> Self {
        Self {
            kind,
            elapsed: Duration::ZERO,
            duration,
            payload: ActionPayload::Offset(offset),
        }
    }

    /// Kind of the action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Time accumulated so far, including carried overflow.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time the action needs before it can complete.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Displacement carried by moves and pushes.
    #[must_use]
    pub fn offset(&self) -> Option<Offset> {
        match &self.payload {
            ActionPayload::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Displacement applied to the entity's position if the action resolves.
    #[must_use]
    pub fn relocation(&self) -> Option<Offset> {
        if self.kind.is_relocation() {
            self.offset()
        } else {
            None
        }
    }

    /// Tutorial step carried by the action.
    #[must_use]
    pub fn tutorial_step(&self) -> Option<&TutorialStep> {
        match &self.payload {
            ActionPayload::Tutorial(step) => Some(step),
            _ => None,
        }
    }

    /// Reports whether the action has accumulated its full duration.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Time accumulated beyond the duration.
    #[must_use]
    pub fn overflow(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }

    /// Time still needed before the action can complete.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }

    /// Completed fraction in `0.0..=1.0`; zero-length actions report `1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Adds simulated time to the action.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }
}

/// Screen-space coordinate supplied by the presentation layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenPoint {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
}

impl ScreenPoint {
    /// Creates a new screen coordinate.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Caller-supplied predicate polled every tick while a tutorial step is shown.
#[derive(Clone)]
pub struct StepCondition(Rc<dyn Fn() -> bool>);

impl StepCondition {
    /// Wraps the provided predicate.
    pub fn new(predicate: impl Fn() -> bool + 'static) -> Self {
        Self(Rc::new(predicate))
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn is_met(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for StepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StepCondition(..)")
    }
}

impl PartialEq for StepCondition {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Single tutorial hint: an image shown at a screen position until its
/// condition holds.
#[derive(Clone, Debug, PartialEq)]
pub struct TutorialStep {
    /// Predicate that advances the tutorial once it returns `true`.
    pub condition: StepCondition,
    /// Asset key of the image rendered for this step.
    pub image: String,
    /// Screen position of the image.
    pub screen: ScreenPoint,
}

impl TutorialStep {
    /// Creates a new tutorial step.
    pub fn new(
        condition: impl Fn() -> bool + 'static,
        image: impl Into<String>,
        screen: ScreenPoint,
    ) -> Self {
        Self {
            condition: StepCondition::new(condition),
            image: image.into(),
            screen,
        }
    }
}
