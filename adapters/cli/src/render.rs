//! Plain-text rendering of the board and of the selected player's plan.

use std::fmt::Write as _;

use tick_tactics_core::{
    ActionKind, CellCoord, Direction, EntityId, EntityKind, EntitySnapshot, EntityState,
    EntityView,
};
use tick_tactics_system_overlay::{Overlay, PushHint};
use tick_tactics_world::{query, World};

/// Draws one character per cell, picking the most relevant occupant.
pub(crate) fn board(world: &World) -> String {
    let (columns, rows) = query::dimensions(world);
    let view = query::entity_view(world);
    let selectable = query::session(world).selectable;
    let mut out = String::new();

    for row in 0..rows {
        for column in 0..columns {
            let cell = CellCoord::new(
                i32::try_from(column).unwrap_or(i32::MAX),
                i32::try_from(row).unwrap_or(i32::MAX),
            );
            out.push(glyph(world, &view, &selectable, cell));
        }
        out.push('\n');
    }
    out
}

fn glyph(
    world: &World,
    view: &EntityView,
    selectable: &[Option<EntityId>],
    cell: CellCoord,
) -> char {
    let top = query::occupants(world, cell)
        .into_iter()
        .filter_map(|(id, _)| view.get(id))
        .max_by_key(|snapshot| priority(snapshot.kind));
    let Some(snapshot) = top else {
        return '.';
    };
    if snapshot.is_dying() {
        return 'x';
    }

    match snapshot.kind {
        EntityKind::Player => selectable
            .iter()
            .position(|slot| *slot == Some(snapshot.id))
            .and_then(|slot| u32::try_from(slot + 1).ok())
            .and_then(|digit| char::from_digit(digit, 10))
            .unwrap_or('P'),
        EntityKind::Rock => '#',
        EntityKind::Trash => 't',
        EntityKind::Spike => spike_glyph(snapshot),
        EntityKind::Cannon => match snapshot.heading {
            Some(Direction::North) => '^',
            Some(Direction::East) => '>',
            Some(Direction::South) => 'v',
            Some(Direction::West) => '<',
            None => 'C',
        },
        EntityKind::Fireball => '*',
        EntityKind::Coin => 'c',
        EntityKind::TutorialMarker => '?',
    }
}

fn spike_glyph(snapshot: &EntitySnapshot) -> char {
    match snapshot.state {
        EntityState::Acting(ActionKind::SpikeUp) => 'S',
        _ => 's',
    }
}

fn priority(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Player => 7,
        EntityKind::Fireball => 6,
        EntityKind::Trash => 5,
        EntityKind::Coin => 4,
        EntityKind::Cannon => 3,
        EntityKind::Spike => 2,
        EntityKind::Rock => 1,
        EntityKind::TutorialMarker => 0,
    }
}

/// Summarises the selected player's queued plan.
pub(crate) fn plan(world: &World) -> Option<String> {
    let selected = query::selected_entity(world)?;
    let snapshot = query::entity(world, selected)?;
    let frame = Overlay::build(&snapshot, query::level_time(world), world);

    let mut out = String::new();
    let _ = write!(
        out,
        "player {} at ({}, {})",
        selected.get(),
        snapshot.cell.column(),
        snapshot.cell.row()
    );
    for segment in &frame.path {
        let _ = write!(out, " -> ({}, {})", segment.to.column(), segment.to.row());
    }
    if let Some(head) = frame.head {
        let _ = write!(out, " | {:?} {:.0}%", head.kind, head.progress * 100.0);
    }
    let _ = write!(
        out,
        " | done at {:.2}s",
        frame.completes_at.as_secs_f32()
    );
    if frame.stalled {
        out.push_str(" | stalled");
    }
    let hints: Vec<String> = frame
        .hints
        .iter()
        .filter(|(_, hint)| *hint == PushHint::Beneficial)
        .map(|(direction, _)| format!("{direction:?}"))
        .collect();
    if !hints.is_empty() {
        let _ = write!(out, " | push: {}", hints.join(","));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_tactics_world::{GameConfig, Level};

    #[test]
    fn board_draws_every_kind_of_tile() {
        let level = Level::from_rows("render", &["w12t", "sc>a"]).expect("valid level");
        let world = World::new(&level, GameConfig::default());
        assert_eq!(board(&world), "#12t\nsc>.\n");
    }

    #[test]
    fn plan_lists_the_selected_path() {
        let level = Level::from_rows("render", &["1at"]).expect("valid level");
        let world = World::new(&level, GameConfig::default());
        let text = plan(&world).expect("selected player");
        assert!(text.starts_with("player 0 at (0, 0)"));
        assert!(text.ends_with("done at 0.00s"));
    }
}
