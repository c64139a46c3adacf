#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system deriving planning overlays from entity snapshots.
//!
//! The overlay never touches the world. It walks the queued actions of one
//! entity, starting at its authoritative cell, and asks a [`PushRules`]
//! implementation which neighbouring pushes are worth highlighting.

use std::time::Duration;

use tick_tactics_core::{ActionKind, CellCoord, Direction, EntityId, EntitySnapshot};
use tick_tactics_world::{query, World};

/// Push legality predicates consulted while building an overlay.
pub trait PushRules {
    /// Reports whether a push may target the cell at all.
    fn is_pushable(&self, cell: CellCoord) -> bool;

    /// Reports whether pushing the contents of `from` into `to` moves
    /// something into a cell that accepts it.
    fn is_beneficial(&self, from: CellCoord, to: CellCoord) -> bool;
}

impl PushRules for World {
    fn is_pushable(&self, cell: CellCoord) -> bool {
        query::is_pushable_pos(self, cell)
    }

    fn is_beneficial(&self, from: CellCoord, to: CellCoord) -> bool {
        query::should_show_green_push_indicator(self, from, to)
    }
}

/// One leg of the queued relocation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathSegment {
    /// Cell the leg starts from.
    pub from: CellCoord,
    /// Cell the leg ends in.
    pub to: CellCoord,
}

/// Queued push drawn next to the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushMarker {
    /// Cell whose occupants will be shoved.
    pub from: CellCoord,
    /// Cell the occupants will be shoved into.
    pub to: CellCoord,
    /// Whether the push currently looks useful.
    pub beneficial: bool,
}

/// Progress of the action at the head of the queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadProgress {
    /// Kind of the head action.
    pub kind: ActionKind,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f32,
    /// Time until the head action may complete.
    pub remaining: Duration,
}

/// Classification of a push towards one neighbour of the projected end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PushHint {
    /// The push would move something into a free cell.
    Beneficial,
    /// The push is legal but currently pointless.
    Allowed,
    /// The push cannot be queued.
    Blocked,
}

/// Overlay data for a single entity.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayFrame {
    /// Entity the overlay describes.
    pub entity: EntityId,
    /// Queued relocations, in execution order.
    pub path: Vec<PathSegment>,
    /// Queued pushes, in execution order.
    pub pushes: Vec<PushMarker>,
    /// Progress of the head action, if any.
    pub head: Option<HeadProgress>,
    /// Time until the queue drains if nothing stalls.
    pub remaining: Duration,
    /// Level time at which the queue is forecast to drain.
    pub completes_at: Duration,
    /// Whether the head move is waiting on an obstruction.
    pub stalled: bool,
    /// Push hints around the projected end, clockwise from north.
    pub hints: [(Direction, PushHint); 4],
}

impl OverlayFrame {
    /// Hint for pushing in the provided direction.
    #[must_use]
    pub fn hint(&self, direction: Direction) -> PushHint {
        self.hints
            .iter()
            .find(|(candidate, _)| *candidate == direction)
            .map_or(PushHint::Blocked, |(_, hint)| *hint)
    }
}

/// Stateless overlay builder.
#[derive(Debug, Default)]
pub struct Overlay;

impl Overlay {
    /// Builds the overlay of one entity at the provided level time.
    #[must_use]
    pub fn build<R>(snapshot: &EntitySnapshot, level_time: Duration, rules: &R) -> OverlayFrame
    where
        R: PushRules + ?Sized,
    {
        let mut path = Vec::new();
        let mut pushes = Vec::new();
        let mut cursor = snapshot.cell;

        for action in &snapshot.actions {
            if let Some(offset) = action.relocation() {
                let to = cursor.offset(offset);
                path.push(PathSegment { from: cursor, to });
                cursor = to;
            } else if action.kind() == ActionKind::Pushing {
                if let Some(offset) = action.offset() {
                    let from = cursor.offset(offset);
                    let to = from.offset(offset);
                    pushes.push(PushMarker {
                        from,
                        to,
                        beneficial: rules.is_beneficial(from, to),
                    });
                }
            }
        }

        let remaining = snapshot.remaining_time();
        OverlayFrame {
            entity: snapshot.id,
            path,
            pushes,
            head: snapshot.head().map(|action| HeadProgress {
                kind: action.kind(),
                progress: action.progress(),
                remaining: action.remaining(),
            }),
            remaining,
            completes_at: level_time.saturating_add(remaining),
            stalled: snapshot.stalled,
            hints: Direction::ALL.map(|direction| {
                (direction, classify(snapshot.projected_end, direction, rules))
            }),
        }
    }
}

fn classify<R>(origin: CellCoord, direction: Direction, rules: &R) -> PushHint
where
    R: PushRules + ?Sized,
{
    let from = origin.step(direction);
    if !rules.is_pushable(from) {
        return PushHint::Blocked;
    }
    if rules.is_beneficial(from, from.step(direction)) {
        PushHint::Beneficial
    } else {
        PushHint::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick_tactics_core::{
        Action, EntityColor, EntityKind, EntityState, Facing, Offset,
    };

    /// Grid of width four with a rock at (3, 0) and trash at (1, 1).
    struct Fixture;

    impl PushRules for Fixture {
        fn is_pushable(&self, cell: CellCoord) -> bool {
            (0..4).contains(&cell.column())
                && (0..3).contains(&cell.row())
                && cell != CellCoord::new(3, 0)
        }

        fn is_beneficial(&self, from: CellCoord, to: CellCoord) -> bool {
            from == CellCoord::new(1, 1) && self.is_pushable(to)
        }
    }

    fn snapshot(actions: Vec<Action>) -> EntitySnapshot {
        let cell = CellCoord::new(0, 0);
        let projected_end = actions
            .iter()
            .filter_map(Action::relocation)
            .fold(cell, CellCoord::offset);
        EntitySnapshot {
            id: EntityId::new(7),
            kind: EntityKind::Player,
            cell,
            projected_end,
            state: EntityState::Idle,
            facing: Facing::Right,
            heading: None,
            color: EntityColor::from_hex(0xff0000),
            stalled: false,
            actions,
        }
    }

    fn half() -> Duration {
        Duration::from_millis(500)
    }

    #[test]
    fn path_follows_queued_relocations() {
        let mut first = Action::movement(Offset::new(1, 0), half());
        first.advance(Duration::from_millis(250));
        let frame = Overlay::build(
            &snapshot(vec![first, Action::movement(Offset::new(0, 1), half())]),
            Duration::from_secs(3),
            &Fixture,
        );

        assert_eq!(
            frame.path,
            vec![
                PathSegment {
                    from: CellCoord::new(0, 0),
                    to: CellCoord::new(1, 0),
                },
                PathSegment {
                    from: CellCoord::new(1, 0),
                    to: CellCoord::new(1, 1),
                },
            ]
        );
        let head = frame.head.expect("head progress");
        assert_eq!(head.kind, ActionKind::Move);
        assert!((head.progress - 0.5).abs() < f32::EPSILON);
        assert_eq!(frame.remaining, Duration::from_millis(750));
        assert_eq!(frame.completes_at, Duration::from_millis(3750));
    }

    #[test]
    fn push_markers_start_from_the_cell_reached_so_far() {
        let frame = Overlay::build(
            &snapshot(vec![
                Action::movement(Offset::new(0, 1), half()),
                Action::pushing(Offset::new(1, 0), half()),
            ]),
            Duration::ZERO,
            &Fixture,
        );

        assert_eq!(
            frame.pushes,
            vec![PushMarker {
                from: CellCoord::new(1, 1),
                to: CellCoord::new(2, 1),
                beneficial: true,
            }]
        );
    }

    #[test]
    fn hints_classify_every_neighbour_of_the_projected_end() {
        let frame = Overlay::build(
            &snapshot(vec![Action::movement(Offset::new(0, 1), half())]),
            Duration::ZERO,
            &Fixture,
        );

        assert_eq!(frame.hint(Direction::East), PushHint::Beneficial);
        assert_eq!(frame.hint(Direction::South), PushHint::Allowed);
        assert_eq!(frame.hint(Direction::West), PushHint::Blocked);
        assert_eq!(frame.hint(Direction::North), PushHint::Allowed);
    }

    #[test]
    fn idle_entities_have_an_empty_plan() {
        let frame = Overlay::build(&snapshot(Vec::new()), Duration::from_secs(1), &Fixture);
        assert!(frame.path.is_empty());
        assert!(frame.head.is_none());
        assert_eq!(frame.completes_at, Duration::from_secs(1));
    }
}
