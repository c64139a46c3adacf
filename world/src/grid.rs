//! Dense occupancy grid mapping cells to the entities standing on them.

use std::collections::BTreeMap;

use tick_tactics_core::{CellCoord, EntityId, EntityKind};

/// Fixed-size array of occupancy sets, one per cell.
///
/// Every cell stores the identifiers of its occupants together with their
/// kind, which never changes, so rule predicates can inspect a cell without
/// touching the entity roster.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<BTreeMap<EntityId, EntityKind>>,
}

impl Grid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![BTreeMap::new(); capacity],
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub(crate) fn in_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Occupants of the cell in identifier order. Out-of-bounds cells are empty.
    pub(crate) fn occupants(
        &self,
        cell: CellCoord,
    ) -> impl Iterator<Item = (EntityId, EntityKind)> + '_ {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .into_iter()
            .flat_map(|occupants| occupants.iter().map(|(id, kind)| (*id, *kind)))
    }

    pub(crate) fn contains(&self, cell: CellCoord, entity: EntityId) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .is_some_and(|occupants| occupants.contains_key(&entity))
    }

    pub(crate) fn holds_any(&self, cell: CellCoord, kinds: &[EntityKind]) -> bool {
        self.occupants(cell).any(|(_, kind)| kinds.contains(&kind))
    }

    pub(crate) fn add(&mut self, entity: EntityId, kind: EntityKind, cell: CellCoord) {
        if let Some(occupants) = self.cell_mut(cell) {
            let _ = occupants.insert(entity, kind);
        }
    }

    /// Removes the entity from the cell; removing an absent entity is a no-op.
    pub(crate) fn remove(&mut self, entity: EntityId, cell: CellCoord) -> bool {
        self.cell_mut(cell)
            .is_some_and(|occupants| occupants.remove(&entity).is_some())
    }

    pub(crate) fn relocate(
        &mut self,
        entity: EntityId,
        kind: EntityKind,
        from: CellCoord,
        to: CellCoord,
    ) {
        let _ = self.remove(entity, from);
        self.add(entity, kind, to);
    }

    fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut BTreeMap<EntityId, EntityKind>> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_overflowing_cells_are_out_of_bounds() {
        let grid = Grid::new(3, 2);
        assert!(grid.in_bounds(CellCoord::new(2, 1)));
        assert!(!grid.in_bounds(CellCoord::new(3, 1)));
        assert!(!grid.in_bounds(CellCoord::new(0, 2)));
        assert!(!grid.in_bounds(CellCoord::new(-1, 0)));
    }

    #[test]
    fn relocation_moves_membership_between_cells() {
        let mut grid = Grid::new(3, 3);
        let id = EntityId::new(4);
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(1, 0);
        grid.add(id, EntityKind::Trash, from);
        grid.relocate(id, EntityKind::Trash, from, to);

        assert!(!grid.contains(from, id));
        assert!(grid.contains(to, id));
        assert!(grid.holds_any(to, &[EntityKind::Trash]));
        assert!(!grid.holds_any(to, &[EntityKind::Rock]));
    }

    #[test]
    fn removing_twice_is_a_no_op() {
        let mut grid = Grid::new(2, 2);
        let id = EntityId::new(1);
        let cell = CellCoord::new(1, 1);
        grid.add(id, EntityKind::Coin, cell);

        assert!(grid.remove(id, cell));
        assert!(!grid.remove(id, cell));
        assert_eq!(grid.occupants(cell).count(), 0);
    }

    #[test]
    fn occupants_are_listed_in_identifier_order() {
        let mut grid = Grid::new(1, 1);
        let cell = CellCoord::new(0, 0);
        grid.add(EntityId::new(9), EntityKind::Spike, cell);
        grid.add(EntityId::new(2), EntityKind::Player, cell);

        let ids: Vec<_> = grid.occupants(cell).map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(grid.occupants(CellCoord::new(5, 5)).count(), 0);
    }
}
