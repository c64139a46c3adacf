//! Placement predicates shared by input validation, resolution and overlays.

use tick_tactics_core::{CellCoord, EntityKind};

use crate::grid::Grid;

const PLAYER_BLOCKERS: &[EntityKind] = &[EntityKind::Rock, EntityKind::Player, EntityKind::Trash];
const FIREBALL_BLOCKERS: &[EntityKind] = &[EntityKind::Rock];
const OBJECT_BLOCKERS: &[EntityKind] = &[
    EntityKind::Rock,
    EntityKind::Player,
    EntityKind::Trash,
    EntityKind::Cannon,
];
const PUSH_WORTHY: &[EntityKind] = &[
    EntityKind::Player,
    EntityKind::Trash,
    EntityKind::Spike,
    EntityKind::Fireball,
    EntityKind::Cannon,
    EntityKind::Coin,
];

/// Kinds that prevent an entity of the provided kind from entering a cell.
fn blockers(mover: EntityKind) -> &'static [EntityKind] {
    match mover {
        EntityKind::Player => PLAYER_BLOCKERS,
        EntityKind::Fireball => FIREBALL_BLOCKERS,
        _ => OBJECT_BLOCKERS,
    }
}

/// Reports whether an entity of the provided kind may relocate into `cell`.
pub(crate) fn can_enter(grid: &Grid, mover: EntityKind, cell: CellCoord) -> bool {
    grid.in_bounds(cell) && !grid.holds_any(cell, blockers(mover))
}

/// A queued move may target any in-bounds cell without a rock.
pub(crate) fn is_valid_move_pos(grid: &Grid, cell: CellCoord) -> bool {
    grid.in_bounds(cell) && !grid.holds_any(cell, &[EntityKind::Rock])
}

/// A push may target any in-bounds cell without a rock.
pub(crate) fn is_pushable_pos(grid: &Grid, cell: CellCoord) -> bool {
    is_valid_move_pos(grid, cell)
}

/// Reports whether pushing the contents of `from` into `to` would move
/// something worth moving into a cell that accepts it.
pub(crate) fn should_show_green_push_indicator(grid: &Grid, from: CellCoord, to: CellCoord) -> bool {
    grid.holds_any(from, PUSH_WORTHY) && can_enter(grid, EntityKind::Trash, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_tactics_core::EntityId;

    fn grid_with(entries: &[(u32, EntityKind, (i32, i32))]) -> Grid {
        let mut grid = Grid::new(4, 3);
        for (id, kind, (column, row)) in entries {
            grid.add(EntityId::new(*id), *kind, CellCoord::new(*column, *row));
        }
        grid
    }

    #[test]
    fn players_are_blocked_by_rocks_players_and_trash_only() {
        let grid = grid_with(&[
            (0, EntityKind::Rock, (0, 0)),
            (1, EntityKind::Player, (1, 0)),
            (2, EntityKind::Trash, (2, 0)),
            (3, EntityKind::Cannon, (3, 0)),
            (4, EntityKind::Spike, (0, 1)),
        ]);
        assert!(!can_enter(&grid, EntityKind::Player, CellCoord::new(0, 0)));
        assert!(!can_enter(&grid, EntityKind::Player, CellCoord::new(1, 0)));
        assert!(!can_enter(&grid, EntityKind::Player, CellCoord::new(2, 0)));
        assert!(can_enter(&grid, EntityKind::Player, CellCoord::new(3, 0)));
        assert!(can_enter(&grid, EntityKind::Player, CellCoord::new(0, 1)));
        assert!(!can_enter(&grid, EntityKind::Player, CellCoord::new(-1, 1)));
    }

    #[test]
    fn fireballs_only_stop_at_rocks() {
        let grid = grid_with(&[(0, EntityKind::Rock, (0, 0)), (1, EntityKind::Player, (1, 0))]);
        assert!(!can_enter(&grid, EntityKind::Fireball, CellCoord::new(0, 0)));
        assert!(can_enter(&grid, EntityKind::Fireball, CellCoord::new(1, 0)));
    }

    #[test]
    fn pushed_objects_cannot_enter_cannons() {
        let grid = grid_with(&[(0, EntityKind::Cannon, (2, 2))]);
        assert!(!can_enter(&grid, EntityKind::Trash, CellCoord::new(2, 2)));
        assert!(can_enter(&grid, EntityKind::Fireball, CellCoord::new(2, 2)));
    }

    #[test]
    fn rocks_and_bounds_limit_move_and_push_targets() {
        let grid = grid_with(&[(0, EntityKind::Rock, (1, 1)), (1, EntityKind::Trash, (2, 1))]);
        assert!(!is_valid_move_pos(&grid, CellCoord::new(1, 1)));
        assert!(is_valid_move_pos(&grid, CellCoord::new(2, 1)));
        assert!(!is_pushable_pos(&grid, CellCoord::new(4, 0)));
        assert!(is_pushable_pos(&grid, CellCoord::new(2, 1)));
    }

    #[test]
    fn green_indicator_needs_cargo_and_free_destination() {
        let grid = grid_with(&[
            (0, EntityKind::Trash, (1, 0)),
            (1, EntityKind::Rock, (3, 0)),
            (2, EntityKind::Coin, (1, 2)),
        ]);
        assert!(should_show_green_push_indicator(
            &grid,
            CellCoord::new(1, 0),
            CellCoord::new(2, 0)
        ));
        assert!(!should_show_green_push_indicator(
            &grid,
            CellCoord::new(2, 0),
            CellCoord::new(3, 0)
        ));
        assert!(!should_show_green_push_indicator(
            &grid,
            CellCoord::new(0, 0),
            CellCoord::new(0, 1)
        ));
        assert!(should_show_green_push_indicator(
            &grid,
            CellCoord::new(1, 2),
            CellCoord::new(2, 2)
        ));
        assert!(!should_show_green_push_indicator(
            &grid,
            CellCoord::new(1, 2),
            CellCoord::new(1, 3)
        ));
    }
}
