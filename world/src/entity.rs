//! Simulated objects and the operations that keep them in sync with the grid.

use std::time::Duration;

use tick_tactics_core::{
    Action, ActionKind, CellCoord, Direction, EntityColor, EntityId, EntityKind, EntitySnapshot,
    EntityState, Facing, Offset,
};

use crate::{config::GameConfig, grid::Grid, queue::ActionQueue};

const NEUTRAL_TINT: EntityColor = EntityColor::from_hex(0xff_ff_ff);

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) kind: EntityKind,
    position: CellCoord,
    projected_end: CellCoord,
    queue: Option<ActionQueue>,
    pub(crate) facing: Facing,
    pub(crate) state: EntityState,
    pub(crate) heading: Option<Direction>,
    pub(crate) color: EntityColor,
    pub(crate) stalled: bool,
    pub(crate) move_speed: Duration,
    pub(crate) fire_phase: Duration,
}

impl Entity {
    /// Creates the entity and registers it with the grid.
    pub(crate) fn spawn(grid: &mut Grid, id: EntityId, kind: EntityKind, cell: CellCoord) -> Self {
        grid.add(id, kind, cell);
        Self {
            id,
            kind,
            position: cell,
            projected_end: cell,
            queue: kind.has_action_queue().then(ActionQueue::new),
            facing: Facing::default(),
            state: EntityState::Idle,
            heading: None,
            color: NEUTRAL_TINT,
            stalled: false,
            move_speed: Duration::ZERO,
            fire_phase: Duration::ZERO,
        }
    }

    pub(crate) fn position(&self) -> CellCoord {
        self.position
    }

    pub(crate) fn projected_end(&self) -> CellCoord {
        self.projected_end
    }

    /// Moves the entity, updating its grid membership in the same step.
    pub(crate) fn relocate(&mut self, grid: &mut Grid, to: CellCoord) {
        debug_assert!(grid.contains(self.position, self.id));
        grid.relocate(self.id, self.kind, self.position, to);
        self.position = to;
    }

    /// Unregisters the entity from the grid; a second call is a no-op.
    pub(crate) fn despawn(&self, grid: &mut Grid) {
        let _ = grid.remove(self.id, self.position);
    }

    pub(crate) fn queue(&self) -> Option<&ActionQueue> {
        self.queue.as_ref()
    }

    pub(crate) fn queue_mut(&mut self) -> Option<&mut ActionQueue> {
        self.queue.as_mut()
    }

    pub(crate) fn head(&self) -> Option<&Action> {
        self.queue.as_ref().and_then(ActionQueue::front)
    }

    /// Recomputes the projected end from the pending relocations.
    pub(crate) fn refresh_projection(&mut self) {
        let pending = self
            .queue
            .as_ref()
            .map_or(Offset::ZERO, ActionQueue::pending_offset);
        self.projected_end = self.position.offset(pending);
    }

    pub(crate) fn is_dying(&self) -> bool {
        self.head().is_some_and(|action| action.kind().is_explosion())
    }

    /// Replaces the queue with an explosion. Returns `false` for entities that
    /// cannot die or are already exploding.
    pub(crate) fn arm_explosion(&mut self, config: &GameConfig) -> bool {
        if !self.kind.is_tangible() || self.is_dying() {
            return false;
        }
        let explosion = match self.kind {
            EntityKind::Fireball => {
                Action::timer(ActionKind::ExplodeSmall, config.explode_small_duration)
            }
            _ => Action::timer(ActionKind::Explode, config.explode_duration),
        };
        let Some(queue) = self.queue.as_mut() else {
            return false;
        };
        queue.clear();
        queue.push_back(explosion);
        self.stalled = false;
        self.refresh_projection();
        true
    }

    /// Replaces the queue with a forced relocation. Returns `false` for
    /// entities that cannot be pushed.
    pub(crate) fn arm_pushed(&mut self, offset: Offset, duration: Duration) -> bool {
        if !self.kind.is_tangible() || self.is_dying() {
            return false;
        }
        let Some(queue) = self.queue.as_mut() else {
            return false;
        };
        queue.clear();
        queue.push_front(Action::pushed(offset, duration));
        self.stalled = false;
        self.refresh_projection();
        true
    }

    /// Refills the queue of periodic kinds once it drained. Returns whether
    /// anything was queued.
    pub(crate) fn rearm_cycle(&mut self, config: &GameConfig) -> bool {
        let cycle: Vec<Action> = match self.kind {
            EntityKind::Spike => vec![
                Action::timer(ActionKind::SpikePrep, config.spike_prep),
                Action::timer(ActionKind::SpikeUp, config.spike_up),
                Action::timer(ActionKind::SpikeDown, config.spike_down),
                Action::timer(ActionKind::SpikeIdle, config.spike_idle),
            ],
            EntityKind::Cannon => vec![
                Action::timer(ActionKind::CannonIdle, self.fire_phase),
                Action::timer(ActionKind::CannonFire, self.fire_phase),
            ],
            _ => return false,
        };
        let Some(queue) = self.queue.as_mut() else {
            return false;
        };
        for action in cycle {
            queue.push_back(action);
        }
        true
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.position,
            projected_end: self.projected_end,
            state: self.state,
            facing: self.facing,
            heading: self.heading,
            color: self.color,
            stalled: self.stalled,
            actions: self
                .queue
                .as_ref()
                .map(|queue| queue.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(grid: &mut Grid, kind: EntityKind) -> Entity {
        Entity::spawn(grid, EntityId::new(1), kind, CellCoord::new(1, 1))
    }

    #[test]
    fn relocation_keeps_grid_membership_in_sync() {
        let mut grid = Grid::new(3, 3);
        let mut entity = spawn(&mut grid, EntityKind::Player);
        entity.relocate(&mut grid, CellCoord::new(2, 1));

        assert_eq!(entity.position(), CellCoord::new(2, 1));
        assert!(grid.contains(CellCoord::new(2, 1), entity.id));
        assert!(!grid.contains(CellCoord::new(1, 1), entity.id));
    }

    #[test]
    fn rocks_have_no_queue_and_cannot_die() {
        let mut grid = Grid::new(3, 3);
        let mut rock = spawn(&mut grid, EntityKind::Rock);
        assert!(rock.queue().is_none());
        assert!(!rock.arm_explosion(&GameConfig::default()));
        assert!(!rock.arm_pushed(Offset::new(1, 0), Duration::from_millis(250)));
    }

    #[test]
    fn explosions_are_armed_once() {
        let mut grid = Grid::new(3, 3);
        let config = GameConfig::default();
        let mut fireball = spawn(&mut grid, EntityKind::Fireball);
        assert!(fireball.arm_explosion(&config));
        assert!(!fireball.arm_explosion(&config));
        assert_eq!(
            fireball.head().map(Action::kind),
            Some(ActionKind::ExplodeSmall)
        );
    }

    #[test]
    fn spike_cycle_runs_prep_up_down_idle() {
        let mut grid = Grid::new(3, 3);
        let mut spike = spawn(&mut grid, EntityKind::Spike);
        assert!(spike.rearm_cycle(&GameConfig::default()));

        let kinds: Vec<_> = spike
            .queue()
            .expect("spike queue")
            .iter()
            .map(Action::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::SpikePrep,
                ActionKind::SpikeUp,
                ActionKind::SpikeDown,
                ActionKind::SpikeIdle,
            ]
        );
    }

    #[test]
    fn projection_follows_pending_relocations() {
        let mut grid = Grid::new(4, 4);
        let mut player = spawn(&mut grid, EntityKind::Player);
        let queue = player.queue_mut().expect("player queue");
        queue.push_back(Action::movement(Offset::new(1, 0), Duration::from_millis(500)));
        queue.push_back(Action::movement(Offset::new(0, 1), Duration::from_millis(500)));
        player.refresh_projection();

        assert_eq!(player.projected_end(), CellCoord::new(2, 2));
        assert_eq!(player.position(), CellCoord::new(1, 1));
    }
}
