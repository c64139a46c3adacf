//! Per-tick resolution of every entity's head action.
//!
//! Entities are visited in identifier order. Effects that reach beyond the
//! entity being resolved (kills, shoves, spawns, removals) are collected and
//! applied right after that entity finishes, so every step observes a grid in
//! which positions and occupancy agree.

use std::{collections::VecDeque, time::Duration};

use tick_tactics_core::{
    Action, ActionKind, CellCoord, Direction, EntityId, EntityKind, EntityState, Event, Offset,
};

use crate::{config::GameConfig, entity::Entity, grid::Grid, rules, World};

#[derive(Debug)]
enum Effect {
    Kill(EntityId),
    Push { cell: CellCoord, offset: Offset },
    Impale { spike: EntityId, cell: CellCoord },
    SpawnFireball { cell: CellCoord, heading: Direction },
    Remove(EntityId),
}

/// Runs one resolution pass over every live entity.
pub(crate) fn advance(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    if world.session.is_paused() {
        return;
    }

    out_events.push(Event::TimeAdvanced { dt });
    world.session.advance_clock(dt);
    world.session.tick_win_timer(dt, out_events);

    let roster: Vec<EntityId> = world.entities.keys().copied().collect();
    let mut effects = VecDeque::new();
    for id in roster {
        let Some(entity) = world.entities.get_mut(&id) else {
            continue;
        };
        step(
            entity,
            &mut world.grid,
            &world.config,
            dt,
            &mut effects,
            out_events,
        );
        apply_effects(world, &mut effects, out_events);
        collect_coins(world, id, out_events);
    }
}

fn step(
    entity: &mut Entity,
    grid: &mut Grid,
    config: &GameConfig,
    dt: Duration,
    effects: &mut VecDeque<Effect>,
    out_events: &mut Vec<Event>,
) {
    entity.refresh_projection();
    if entity.head().is_none() {
        on_idle(entity, grid, config, effects, out_events);
    }

    if let Some(head) = advance_head(entity, dt) {
        if head.kind() == ActionKind::Move {
            if let Some(facing) = head.offset().and_then(Offset::facing) {
                entity.facing = facing;
            }
        }
        if head.is_complete() {
            complete(entity, &head, grid, config, effects, out_events);
        }
    }

    entity.refresh_projection();
    entity.state = entity
        .head()
        .map_or(EntityState::Idle, |action| EntityState::Acting(action.kind()));
}

/// Accumulates `dt` on an unfinished head and returns a copy of it.
fn advance_head(entity: &mut Entity, dt: Duration) -> Option<Action> {
    let head = entity.queue_mut()?.front_mut()?;
    if !head.is_complete() {
        head.advance(dt);
    }
    Some(head.clone())
}

fn on_idle(
    entity: &mut Entity,
    grid: &Grid,
    config: &GameConfig,
    effects: &mut VecDeque<Effect>,
    out_events: &mut Vec<Event>,
) {
    match entity.kind {
        EntityKind::Spike | EntityKind::Cannon => {
            let _ = entity.rearm_cycle(config);
        }
        EntityKind::Fireball => {
            if strike(entity, grid, effects) {
                detonate(entity, config, out_events);
            } else {
                continue_flight(entity, grid, config, Duration::ZERO, out_events);
            }
        }
        EntityKind::TutorialMarker => effects.push_back(Effect::Remove(entity.id)),
        EntityKind::Player | EntityKind::Rock | EntityKind::Trash | EntityKind::Coin => {}
    }
}

fn complete(
    entity: &mut Entity,
    head: &Action,
    grid: &mut Grid,
    config: &GameConfig,
    effects: &mut VecDeque<Effect>,
    out_events: &mut Vec<Event>,
) {
    match head.kind() {
        ActionKind::Move if entity.kind == EntityKind::Fireball => {
            fly(entity, head, grid, config, effects, out_events);
        }
        ActionKind::Move => walk(entity, head, grid, out_events),
        ActionKind::Pushed => {
            finish(entity);
            if let Some(offset) = head.relocation() {
                let to = entity.position().offset(offset);
                if rules::can_enter(grid, entity.kind, to) {
                    relocate(entity, grid, to, out_events);
                }
            }
        }
        ActionKind::Pushing => {
            finish(entity);
            if let Some(offset) = head.offset() {
                effects.push_back(Effect::Push {
                    cell: entity.position().offset(offset),
                    offset,
                });
            }
        }
        ActionKind::SpikePrep => {
            finish(entity);
            effects.push_back(Effect::Impale {
                spike: entity.id,
                cell: entity.position(),
            });
        }
        ActionKind::CannonIdle => {
            finish(entity);
            if let Some(heading) = entity.heading {
                let cell = entity.position().step(heading);
                if grid.in_bounds(cell) {
                    effects.push_back(Effect::SpawnFireball { cell, heading });
                }
            }
        }
        ActionKind::Explode | ActionKind::ExplodeSmall => {
            finish(entity);
            effects.push_back(Effect::Remove(entity.id));
        }
        ActionKind::TutorialStep => {
            if head.tutorial_step().is_some_and(|step| step.condition.is_met()) {
                finish(entity);
                if entity.head().is_none() {
                    effects.push_back(Effect::Remove(entity.id));
                }
            }
        }
        ActionKind::SpikeUp
        | ActionKind::SpikeDown
        | ActionKind::SpikeIdle
        | ActionKind::CannonFire => finish(entity),
    }
}

/// Pops the completed head, carrying its overflow into the next action.
fn finish(entity: &mut Entity) {
    if let Some(queue) = entity.queue_mut() {
        let _ = queue.complete_front();
    }
}

fn relocate(entity: &mut Entity, grid: &mut Grid, to: CellCoord, out_events: &mut Vec<Event>) {
    let from = entity.position();
    entity.relocate(grid, to);
    out_events.push(Event::EntityMoved {
        entity: entity.id,
        from,
        to,
    });
}

/// Self-driven move. A blocked move stays at the head and is retried next tick.
fn walk(entity: &mut Entity, head: &Action, grid: &mut Grid, out_events: &mut Vec<Event>) {
    let Some(offset) = head.relocation() else {
        finish(entity);
        return;
    };
    let to = entity.position().offset(offset);
    if rules::can_enter(grid, entity.kind, to) {
        entity.stalled = false;
        finish(entity);
        relocate(entity, grid, to, out_events);
    } else if entity.kind == EntityKind::Player && !entity.stalled {
        entity.stalled = true;
        out_events.push(Event::MoveStalled {
            entity: entity.id,
            target: to,
        });
    }
}

fn fly(
    entity: &mut Entity,
    head: &Action,
    grid: &mut Grid,
    config: &GameConfig,
    effects: &mut VecDeque<Effect>,
    out_events: &mut Vec<Event>,
) {
    finish(entity);
    let Some(offset) = head.relocation() else {
        return;
    };
    let to = entity.position().offset(offset);
    if !rules::can_enter(grid, entity.kind, to) {
        detonate(entity, config, out_events);
        return;
    }

    relocate(entity, grid, to, out_events);
    if strike(entity, grid, effects) {
        detonate(entity, config, out_events);
    } else {
        continue_flight(entity, grid, config, head.overflow(), out_events);
    }
}

/// Destroys whatever the fireball shares its cell with. Returns whether the
/// fireball hit anything.
fn strike(fireball: &Entity, grid: &Grid, effects: &mut VecDeque<Effect>) -> bool {
    let mut hit = false;
    for (other, kind) in grid.occupants(fireball.position()) {
        if other == fireball.id {
            continue;
        }
        match kind {
            EntityKind::Rock => hit = true,
            EntityKind::Trash
            | EntityKind::Coin
            | EntityKind::Cannon
            | EntityKind::Fireball
            | EntityKind::Player => {
                effects.push_back(Effect::Kill(other));
                hit = true;
            }
            EntityKind::Spike | EntityKind::TutorialMarker => {}
        }
    }
    hit
}

fn continue_flight(
    fireball: &mut Entity,
    grid: &Grid,
    config: &GameConfig,
    carry: Duration,
    out_events: &mut Vec<Event>,
) {
    let Some(heading) = fireball.heading else {
        detonate(fireball, config, out_events);
        return;
    };
    if !grid.in_bounds(fireball.position().step(heading)) {
        detonate(fireball, config, out_events);
        return;
    }

    let mut flight = Action::movement(heading.offset(), config.fireball_step);
    flight.advance(carry);
    if let Some(queue) = fireball.queue_mut() {
        queue.push_back(flight);
    }
}

fn detonate(entity: &mut Entity, config: &GameConfig, out_events: &mut Vec<Event>) {
    if entity.arm_explosion(config) {
        tracing::debug!(entity = entity.id.get(), kind = ?entity.kind, "entity killed");
        out_events.push(Event::EntityKilled {
            entity: entity.id,
            kind: entity.kind,
        });
    }
}

fn apply_effects(world: &mut World, effects: &mut VecDeque<Effect>, out_events: &mut Vec<Event>) {
    while let Some(effect) = effects.pop_front() {
        match effect {
            Effect::Kill(id) => kill(world, id, out_events),
            Effect::Push { cell, offset } => {
                let targets: Vec<EntityId> = world.grid.occupants(cell).map(|(id, _)| id).collect();
                for id in targets {
                    let Some(target) = world.entities.get_mut(&id) else {
                        continue;
                    };
                    if target.arm_pushed(offset, world.config.pushed_duration) {
                        out_events.push(Event::EntityPushed { entity: id, offset });
                    }
                }
            }
            Effect::Impale { spike, cell } => {
                let victims: Vec<EntityId> = world
                    .grid
                    .occupants(cell)
                    .filter(|(id, kind)| *id != spike && *kind != EntityKind::Rock)
                    .map(|(id, _)| id)
                    .collect();
                for id in victims {
                    kill(world, id, out_events);
                }
            }
            Effect::SpawnFireball { cell, heading } => {
                spawn_fireball(world, cell, heading, effects, out_events);
            }
            Effect::Remove(id) => remove(world, id, out_events),
        }
    }
}

fn kill(world: &mut World, id: EntityId, out_events: &mut Vec<Event>) {
    if let Some(entity) = world.entities.get_mut(&id) {
        detonate(entity, &world.config, out_events);
    }
}

fn spawn_fireball(
    world: &mut World,
    cell: CellCoord,
    heading: Direction,
    effects: &mut VecDeque<Effect>,
    out_events: &mut Vec<Event>,
) {
    let id = world.allocate_id();
    let mut fireball = Entity::spawn(&mut world.grid, id, EntityKind::Fireball, cell);
    fireball.heading = Some(heading);
    if let Some(facing) = heading.offset().facing() {
        fireball.facing = facing;
    }
    if let Some(queue) = fireball.queue_mut() {
        queue.push_back(Action::movement(heading.offset(), world.config.fireball_step));
    }

    tracing::debug!(entity = id.get(), ?cell, ?heading, "fireball spawned");
    out_events.push(Event::EntitySpawned {
        entity: id,
        kind: EntityKind::Fireball,
        cell,
    });

    if strike(&fireball, &world.grid, effects) {
        detonate(&mut fireball, &world.config, out_events);
    }
    fireball.refresh_projection();
    let _ = world.entities.insert(id, fireball);
}

/// Removes the entity from the roster and the grid. Removing an entity that
/// is already gone is a no-op.
fn remove(world: &mut World, id: EntityId, out_events: &mut Vec<Event>) {
    let Some(entity) = world.entities.remove(&id) else {
        return;
    };
    entity.despawn(&mut world.grid);

    let cell = entity.position();
    tracing::debug!(entity = id.get(), kind = ?entity.kind, ?cell, "entity removed");
    out_events.push(Event::EntityRemoved {
        entity: id,
        kind: entity.kind,
        cell,
    });

    match entity.kind {
        EntityKind::Coin => world.session.coin_removed(out_events),
        EntityKind::Player => world.session.player_removed(id, out_events),
        _ => {}
    }
}

/// Lets a live player pick up every coin in its cell.
fn collect_coins(world: &mut World, id: EntityId, out_events: &mut Vec<Event>) {
    let Some(player) = world.entities.get(&id) else {
        return;
    };
    if player.kind != EntityKind::Player || player.is_dying() {
        return;
    }

    let coins: Vec<EntityId> = world
        .grid
        .occupants(player.position())
        .filter(|(_, kind)| *kind == EntityKind::Coin)
        .map(|(coin, _)| coin)
        .filter(|coin| {
            world
                .entities
                .get(coin)
                .is_some_and(|entity| !entity.is_dying())
        })
        .collect();

    for coin in coins {
        out_events.push(Event::CoinCollected {
            player: id,
            coin,
            remaining: world.session.coins_remaining().saturating_sub(1),
        });
        remove(world, coin, out_events);
    }
}
