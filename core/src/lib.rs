#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tick Tactics engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player intents or the passage of time, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that presentation layers and systems react to. Systems consume event
//! streams and immutable snapshots, and never mutate the world directly.

mod action;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use action::{Action, ActionKind, ScreenPoint, StepCondition, TutorialStep};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a player queue a one-tile move.
    QueueMove {
        /// Identifier of the player receiving the action.
        entity: EntityId,
        /// Direction of the requested move.
        direction: Direction,
    },
    /// Requests that a player queue a push towards a neighbouring cell.
    QueuePush {
        /// Identifier of the player receiving the action.
        entity: EntityId,
        /// Direction of the push, relative to the player's projected end cell.
        direction: Direction,
    },
    /// Removes the most recently queued action of a player.
    PopLastAction {
        /// Identifier of the player whose queue is trimmed.
        entity: EntityId,
    },
    /// Discards every pending action of a player.
    ClearActions {
        /// Identifier of the player whose queue is cleared.
        entity: EntityId,
    },
    /// Routes subsequent input to the selectable entity stored in a slot.
    SelectSlot {
        /// Zero-based index into the selectable roster.
        slot: usize,
    },
    /// Suspends or resumes the simulation clock.
    SetPaused {
        /// Whether ticks should be ignored.
        paused: bool,
    },
    /// Spawns a tutorial marker driven by the provided steps.
    SpawnTutorial {
        /// Cell the marker is anchored to.
        anchor: CellCoord,
        /// Steps shown in order; the marker disappears after the last one.
        steps: Vec<TutorialStep>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a player intent was appended to a queue.
    ActionQueued {
        /// Entity that received the action.
        entity: EntityId,
        /// Kind of action that was queued.
        kind: ActionKind,
    },
    /// Reports that a player intent was dropped without touching any state.
    ActionRejected {
        /// Entity named by the rejected intent.
        entity: EntityId,
        /// Specific reason the intent was dropped.
        reason: RejectionReason,
    },
    /// Confirms that the last queued action of an entity was removed.
    ActionRemoved {
        /// Entity whose queue shrank.
        entity: EntityId,
        /// Kind of the removed action.
        kind: ActionKind,
    },
    /// Confirms that an entity's queue was emptied on request.
    ActionsCleared {
        /// Entity whose queue was cleared.
        entity: EntityId,
    },
    /// Confirms that an entity relocated between two cells.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// Cell occupied before the move.
        from: CellCoord,
        /// Cell occupied after the move.
        to: CellCoord,
    },
    /// Reports that a player's head move became blocked.
    MoveStalled {
        /// Player waiting for the obstruction to clear.
        entity: EntityId,
        /// Cell the player is trying to enter.
        target: CellCoord,
    },
    /// Reports that an entity was shoved by a completed push.
    EntityPushed {
        /// Entity that had its queue replaced by a pushed action.
        entity: EntityId,
        /// Displacement the entity will attempt.
        offset: Offset,
    },
    /// Reports that an entity started exploding and will be removed.
    EntityKilled {
        /// Entity that is exploding.
        entity: EntityId,
        /// Kind of the exploding entity.
        kind: EntityKind,
    },
    /// Confirms that a new entity entered the world.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Kind of the spawned entity.
        kind: EntityKind,
        /// Cell the entity occupies.
        cell: CellCoord,
    },
    /// Confirms that an entity left the world permanently.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
        /// Kind of the removed entity.
        kind: EntityKind,
        /// Cell the entity occupied when it was removed.
        cell: CellCoord,
    },
    /// Reports that a player picked up a coin.
    CoinCollected {
        /// Player that collected the coin.
        player: EntityId,
        /// Coin that was collected.
        coin: EntityId,
        /// Coins still present after the pickup.
        remaining: u32,
    },
    /// Announces the entity that now receives player input.
    SelectionChanged {
        /// Newly selected entity, if any survivor remains.
        entity: Option<EntityId>,
    },
    /// Announces that the simulation clock was paused or resumed.
    PauseChanged {
        /// Whether the clock is now paused.
        paused: bool,
    },
    /// Announces that the last coin disappeared and the win timer started.
    LevelWon,
    /// Announces that the win timer elapsed and the level is over.
    LevelFinished,
    /// Announces that every controllable player was removed.
    GameOver,
}

/// Reasons a player intent may be dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// No live entity carries the provided identifier.
    UnknownEntity,
    /// The entity is not a player and cannot receive intents.
    NotControllable,
    /// The entity is exploding and ignores further intents.
    Dying,
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell holds a rock.
    Obstructed,
    /// There was no queued action to remove.
    EmptyQueue,
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Closed set of simulated object kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Controllable character.
    Player,
    /// Immobile, indestructible obstacle.
    Rock,
    /// Pushable obstacle that blocks players.
    Trash,
    /// Pressure spike cycling through its phases.
    Spike,
    /// Turret periodically spawning fireballs.
    Cannon,
    /// Projectile travelling in a straight line.
    Fireball,
    /// Collectible; the level is won when none remain.
    Coin,
    /// Non-interactive marker hosting tutorial steps.
    TutorialMarker,
}

impl EntityKind {
    /// Reports whether entities of this kind own an action queue.
    ///
    /// Rocks never act; every other kind does.
    #[must_use]
    pub const fn has_action_queue(self) -> bool {
        !matches!(self, Self::Rock)
    }

    /// Reports whether entities of this kind take part in grid interactions.
    #[must_use]
    pub const fn is_tangible(self) -> bool {
        !matches!(self, Self::TutorialMarker)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that offsets can be applied before bounds
/// checks; only cells inside the grid ever hold entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell displaced by the provided offset.
    #[must_use]
    pub const fn offset(self, offset: Offset) -> Self {
        Self {
            column: self.column.saturating_add(offset.dx),
            row: self.row.saturating_add(offset.dy),
        }
    }

    /// Returns the neighbouring cell in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        self.offset(direction.offset())
    }
}

/// Signed displacement measured in whole cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    /// Column displacement; positive values point east.
    pub dx: i32,
    /// Row displacement; positive values point south.
    pub dy: i32,
}

impl Offset {
    /// Displacement that leaves a cell unchanged.
    pub const ZERO: Self = Self::new(0, 0);

    /// Creates a new displacement.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Sums two displacements.
    #[must_use]
    pub const fn plus(self, other: Offset) -> Self {
        Self {
            dx: self.dx.saturating_add(other.dx),
            dy: self.dy.saturating_add(other.dy),
        }
    }

    /// Horizontal facing implied by the displacement, if it has a column component.
    #[must_use]
    pub const fn facing(self) -> Option<Facing> {
        if self.dx < 0 {
            Some(Facing::Left)
        } else if self.dx > 0 {
            Some(Facing::Right)
        } else {
            None
        }
    }
}

/// Cardinal directions available to moves, pushes and projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All cardinal directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit displacement associated with the direction.
    #[must_use]
    pub const fn offset(self) -> Offset {
        match self {
            Self::North => Offset::new(0, -1),
            Self::East => Offset::new(1, 0),
            Self::South => Offset::new(0, 1),
            Self::West => Offset::new(-1, 0),
        }
    }

    /// Recovers the direction of a unit displacement.
    #[must_use]
    pub const fn from_offset(offset: Offset) -> Option<Self> {
        match (offset.dx, offset.dy) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }
}

/// Last horizontal facing of an entity, used to mirror sprites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Sprite mirrored towards decreasing columns.
    Left,
    /// Sprite drawn towards increasing columns.
    #[default]
    Right,
}

/// Cosmetic tint applied to an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl EntityColor {
    /// Creates a new color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(value: u32) -> Self {
        Self {
            red: ((value >> 16) & 0xff) as u8,
            green: ((value >> 8) & 0xff) as u8,
            blue: (value & 0xff) as u8,
        }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Derived activity of an entity, refreshed by every resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// The action queue is empty.
    #[default]
    Idle,
    /// The head action of the queue is being resolved.
    Acting(ActionKind),
}

/// Immutable representation of a single entity's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Authoritative cell currently occupied by the entity.
    pub cell: CellCoord,
    /// Cell reached once every queued relocation resolves.
    pub projected_end: CellCoord,
    /// Activity derived from the head of the queue.
    pub state: EntityState,
    /// Last horizontal facing.
    pub facing: Facing,
    /// Firing or travel direction for cannons and fireballs.
    pub heading: Option<Direction>,
    /// Cosmetic tint.
    pub color: EntityColor,
    /// Whether the head move of a player is waiting on an obstruction.
    pub stalled: bool,
    /// Pending actions, head first. Empty for entities without a queue.
    pub actions: Vec<Action>,
}

impl EntitySnapshot {
    /// Head action currently being resolved, if any.
    #[must_use]
    pub fn head(&self) -> Option<&Action> {
        self.actions.first()
    }

    /// Time left until every queued action has run its full duration.
    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        self.actions
            .iter()
            .fold(Duration::ZERO, |total, action| total.saturating_add(action.remaining()))
    }

    /// Reports whether the entity is playing its death animation.
    #[must_use]
    pub fn is_dying(&self) -> bool {
        self.head().is_some_and(|action| action.kind().is_explosion())
    }
}

/// Read-only snapshot describing all live entities.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single entity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&entity, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Iterator over the snapshots of a single kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.kind == kind)
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read-only snapshot of the win/loss bookkeeping of a level attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Coins still present in the level.
    pub coins_remaining: u32,
    /// Whether every controllable player has been removed.
    pub game_over: bool,
    /// Whether the last coin disappeared.
    pub won: bool,
    /// Whether the win delay elapsed after a win.
    pub level_finished: bool,
    /// Whether ticks are currently ignored.
    pub paused: bool,
    /// Unpaused simulated time since the level started.
    pub level_time: Duration,
    /// Entity currently receiving input.
    pub selected: Option<EntityId>,
    /// Fixed-size roster of player slots; removed players leave `None`.
    pub selectable: Vec<Option<EntityId>>,
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, EntityColor, EntityId, EntityKind, Facing, Offset};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn directions_map_to_unit_offsets() {
        for direction in Direction::ALL {
            let offset = direction.offset();
            assert_eq!(offset.dx.abs() + offset.dy.abs(), 1);
            assert_eq!(Direction::from_offset(offset), Some(direction));
        }
        assert_eq!(Direction::from_offset(Offset::new(1, 1)), None);
    }

    #[test]
    fn stepping_west_from_origin_leaves_the_grid() {
        let cell = CellCoord::new(0, 0).step(Direction::West);
        assert_eq!(cell, CellCoord::new(-1, 0));
    }

    #[test]
    fn only_horizontal_offsets_imply_a_facing() {
        assert_eq!(Offset::new(-1, 0).facing(), Some(Facing::Left));
        assert_eq!(Offset::new(1, 0).facing(), Some(Facing::Right));
        assert_eq!(Offset::new(0, 1).facing(), None);
    }

    #[test]
    fn packed_hex_colors_unpack_into_components() {
        let color = EntityColor::from_hex(0x12_34_56);
        assert_eq!((color.red(), color.green(), color.blue()), (0x12, 0x34, 0x56));
    }

    #[test]
    fn rocks_are_the_only_kind_without_a_queue() {
        assert!(!EntityKind::Rock.has_action_queue());
        assert!(EntityKind::Spike.has_action_queue());
        assert!(!EntityKind::TutorialMarker.is_tangible());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_and_cells_round_trip_through_bincode() {
        assert_round_trip(&EntityId::new(42));
        assert_round_trip(&CellCoord::new(-3, 7));
        assert_round_trip(&EntityKind::Fireball);
    }
}
