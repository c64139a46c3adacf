#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tick Tactics.
//!
//! A [`World`] owns the occupancy grid, the entity roster and the session
//! bookkeeping of one level attempt. It only changes through [`apply`], and is
//! observed through the [`query`] module.

mod config;
mod entity;
mod grid;
mod level;
mod queue;
mod resolver;
mod rules;
mod session;

use std::collections::BTreeMap;

use tick_tactics_core::{
    Action, CellCoord, Command, Direction, EntityColor, EntityId, EntityKind, Event,
    RejectionReason, TutorialStep,
};

pub use config::{ConfigError, GameConfig};
pub use level::{Level, LevelError, TileCode};

use entity::Entity;
use grid::Grid;
use session::Session;

const PLAYER_COLORS: [EntityColor; 2] = [
    EntityColor::from_hex(0xff_00_00),
    EntityColor::from_hex(0x00_00_ff),
];

/// Represents the authoritative state of one level attempt.
#[derive(Clone, Debug)]
pub struct World {
    config: GameConfig,
    grid: Grid,
    entities: BTreeMap<EntityId, Entity>,
    session: Session,
    next_entity_id: u32,
}

impl World {
    /// Seeds a fresh world from the level layout.
    ///
    /// Entity identifiers are assigned in row-major order of the layout.
    /// Spikes and cannons start with a full cycle queued.
    #[must_use]
    pub fn new(level: &Level, config: GameConfig) -> Self {
        let mut grid = Grid::new(level.columns(), level.rows());
        let mut entities = BTreeMap::new();
        let mut selectable = vec![None; level.player_slots()];
        let move_speed = level.move_speed().unwrap_or(config.move_speed);
        let fire_phase = level.cannon_phase().unwrap_or(config.cannon_phase);

        let mut next_entity_id = 0_u32;
        for (cell, tile) in level.tiles() {
            let Some(kind) = spawn_kind(tile) else {
                continue;
            };
            let id = EntityId::new(next_entity_id);
            next_entity_id = next_entity_id.saturating_add(1);

            let mut entity = Entity::spawn(&mut grid, id, kind, cell);
            match tile {
                TileCode::Player(slot) => {
                    entity.move_speed = move_speed;
                    if let Some(color) = PLAYER_COLORS.get(slot) {
                        entity.color = *color;
                    }
                    if let Some(entry) = selectable.get_mut(slot) {
                        *entry = Some(id);
                    }
                }
                TileCode::Cannon(heading) => {
                    entity.heading = Some(heading);
                    if let Some(facing) = heading.offset().facing() {
                        entity.facing = facing;
                    }
                    entity.fire_phase = fire_phase;
                    let _ = entity.rearm_cycle(&config);
                }
                TileCode::Spike => {
                    let _ = entity.rearm_cycle(&config);
                }
                TileCode::Floor | TileCode::Rock | TileCode::Trash | TileCode::Coin => {}
            }
            let _ = entities.insert(id, entity);
        }

        let coins = level.coin_count();
        tracing::info!(
            level = level.name(),
            columns = level.columns(),
            rows = level.rows(),
            entities = entities.len(),
            coins,
            "level loaded"
        );

        Self {
            session: Session::new(selectable, coins, config.win_delay),
            config,
            grid,
            entities,
            next_entity_id,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }
}

fn spawn_kind(tile: TileCode) -> Option<EntityKind> {
    let kind = match tile {
        TileCode::Floor => return None,
        TileCode::Rock => EntityKind::Rock,
        TileCode::Player(_) => EntityKind::Player,
        TileCode::Trash => EntityKind::Trash,
        TileCode::Spike => EntityKind::Spike,
        TileCode::Coin => EntityKind::Coin,
        TileCode::Cannon(_) => EntityKind::Cannon,
    };
    Some(kind)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => resolver::advance(world, dt, out_events),
        Command::QueueMove { entity, direction } => {
            queue_move(world, entity, direction, out_events);
        }
        Command::QueuePush { entity, direction } => {
            queue_push(world, entity, direction, out_events);
        }
        Command::PopLastAction { entity } => pop_last_action(world, entity, out_events),
        Command::ClearActions { entity } => clear_actions(world, entity, out_events),
        Command::SelectSlot { slot } => world.session.select_slot(slot, out_events),
        Command::SetPaused { paused } => world.session.set_paused(paused, out_events),
        Command::SpawnTutorial { anchor, steps } => {
            spawn_tutorial(world, anchor, steps, out_events);
        }
    }
}

fn controllable(
    entities: &mut BTreeMap<EntityId, Entity>,
    id: EntityId,
) -> Result<&mut Entity, RejectionReason> {
    let entity = entities
        .get_mut(&id)
        .ok_or(RejectionReason::UnknownEntity)?;
    if entity.kind != EntityKind::Player {
        return Err(RejectionReason::NotControllable);
    }
    if entity.is_dying() {
        return Err(RejectionReason::Dying);
    }
    Ok(entity)
}

fn reject(entity: EntityId, reason: RejectionReason, out_events: &mut Vec<Event>) {
    tracing::trace!(entity = entity.get(), ?reason, "intent rejected");
    out_events.push(Event::ActionRejected { entity, reason });
}

fn check_target(
    grid: &Grid,
    cell: CellCoord,
    accepts: fn(&Grid, CellCoord) -> bool,
) -> Result<(), RejectionReason> {
    if !grid.in_bounds(cell) {
        Err(RejectionReason::OutOfBounds)
    } else if !accepts(grid, cell) {
        Err(RejectionReason::Obstructed)
    } else {
        Ok(())
    }
}

fn enqueue(entity: &mut Entity, action: Action, out_events: &mut Vec<Event>) {
    let kind = action.kind();
    if let Some(queue) = entity.queue_mut() {
        queue.push_back(action);
    }
    entity.refresh_projection();
    out_events.push(Event::ActionQueued {
        entity: entity.id,
        kind,
    });
}

fn queue_move(world: &mut World, id: EntityId, direction: Direction, out_events: &mut Vec<Event>) {
    let player = match controllable(&mut world.entities, id) {
        Ok(player) => player,
        Err(reason) => return reject(id, reason, out_events),
    };
    let target = player.projected_end().step(direction);
    if let Err(reason) = check_target(&world.grid, target, rules::is_valid_move_pos) {
        return reject(id, reason, out_events);
    }

    let action = Action::movement(direction.offset(), player.move_speed);
    enqueue(player, action, out_events);
}

fn queue_push(world: &mut World, id: EntityId, direction: Direction, out_events: &mut Vec<Event>) {
    let player = match controllable(&mut world.entities, id) {
        Ok(player) => player,
        Err(reason) => return reject(id, reason, out_events),
    };
    let target = player.projected_end().step(direction);
    if let Err(reason) = check_target(&world.grid, target, rules::is_pushable_pos) {
        return reject(id, reason, out_events);
    }

    let action = Action::pushing(direction.offset(), world.config.push_duration);
    enqueue(player, action, out_events);
}

fn pop_last_action(world: &mut World, id: EntityId, out_events: &mut Vec<Event>) {
    let player = match controllable(&mut world.entities, id) {
        Ok(player) => player,
        Err(reason) => return reject(id, reason, out_events),
    };
    let Some(removed) = player.queue_mut().and_then(|queue| queue.pop_back()) else {
        return reject(id, RejectionReason::EmptyQueue, out_events);
    };

    player.stalled = player.stalled && player.head().is_some();
    player.refresh_projection();
    out_events.push(Event::ActionRemoved {
        entity: id,
        kind: removed.kind(),
    });
}

fn clear_actions(world: &mut World, id: EntityId, out_events: &mut Vec<Event>) {
    let player = match controllable(&mut world.entities, id) {
        Ok(player) => player,
        Err(reason) => return reject(id, reason, out_events),
    };
    let Some(queue) = player.queue_mut().filter(|queue| !queue.is_empty()) else {
        return reject(id, RejectionReason::EmptyQueue, out_events);
    };

    queue.clear();
    player.stalled = false;
    player.refresh_projection();
    out_events.push(Event::ActionsCleared { entity: id });
}

fn spawn_tutorial(
    world: &mut World,
    anchor: CellCoord,
    steps: Vec<TutorialStep>,
    out_events: &mut Vec<Event>,
) {
    if !world.grid.in_bounds(anchor) {
        tracing::warn!(?anchor, "tutorial anchor lies outside the grid");
        return;
    }

    let id = world.allocate_id();
    let mut marker = Entity::spawn(&mut world.grid, id, EntityKind::TutorialMarker, anchor);
    if let Some(queue) = marker.queue_mut() {
        for step in steps {
            queue.push_back(Action::tutorial(step));
        }
    }
    let _ = world.entities.insert(id, marker);

    tracing::debug!(entity = id.get(), ?anchor, "tutorial spawned");
    out_events.push(Event::EntitySpawned {
        entity: id,
        kind: EntityKind::TutorialMarker,
        cell: anchor,
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{rules, World};
    use tick_tactics_core::{
        CellCoord, EntityId, EntityKind, EntitySnapshot, EntityView, SessionSnapshot,
    };

    /// Captures a read-only view of every live entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(world.entities.values().map(|entity| entity.snapshot()).collect())
    }

    /// Captures the snapshot of a single live entity.
    #[must_use]
    pub fn entity(world: &World, entity: EntityId) -> Option<EntitySnapshot> {
        world.entities.get(&entity).map(|entity| entity.snapshot())
    }

    /// Captures the win/loss bookkeeping of the level attempt.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        world.session.snapshot()
    }

    /// Number of columns and rows of the grid.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.grid.dimensions()
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(world: &World, cell: CellCoord) -> bool {
        world.grid.in_bounds(cell)
    }

    /// Lists the occupants of a cell in identifier order.
    #[must_use]
    pub fn occupants(world: &World, cell: CellCoord) -> Vec<(EntityId, EntityKind)> {
        world.grid.occupants(cell).collect()
    }

    /// Reports whether the live entity could queue a move ending in `cell`.
    #[must_use]
    pub fn is_valid_move_pos(world: &World, entity: EntityId, cell: CellCoord) -> bool {
        world.entities.contains_key(&entity) && rules::is_valid_move_pos(&world.grid, cell)
    }

    /// Reports whether a push may target the cell.
    #[must_use]
    pub fn is_pushable_pos(world: &World, cell: CellCoord) -> bool {
        rules::is_pushable_pos(&world.grid, cell)
    }

    /// Reports whether pushing `from` into `to` deserves a positive indicator.
    #[must_use]
    pub fn should_show_green_push_indicator(world: &World, from: CellCoord, to: CellCoord) -> bool {
        rules::should_show_green_push_indicator(&world.grid, from, to)
    }

    /// Entity currently receiving player input.
    #[must_use]
    pub fn selected_entity(world: &World) -> Option<EntityId> {
        world.session.selected()
    }

    /// Coins still present in the level.
    #[must_use]
    pub fn coins_remaining(world: &World) -> u32 {
        world.session.coins_remaining()
    }

    /// Reports whether the last coin disappeared.
    #[must_use]
    pub fn is_won(world: &World) -> bool {
        world.session.is_won()
    }

    /// Reports whether every controllable player has been removed.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.session.is_game_over()
    }

    /// Unpaused simulated time since the level started.
    #[must_use]
    pub fn level_time(world: &World) -> Duration {
        world.session.level_time()
    }

    /// Time the entity needs to drain its queue if nothing stalls.
    #[must_use]
    pub fn remaining_action_time(world: &World, entity: EntityId) -> Option<Duration> {
        let queue = world.entities.get(&entity)?.queue()?;
        Some(queue.remaining_time())
    }

    /// Level time at which the entity's queue is forecast to drain.
    #[must_use]
    pub fn completion_time(world: &World, entity: EntityId) -> Option<Duration> {
        remaining_action_time(world, entity)
            .map(|remaining| world.session.level_time().saturating_add(remaining))
    }
}
