//! Static level descriptions and their validation.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tick_tactics_core::{CellCoord, Direction};

use crate::config::{self, ConfigError};

/// Terrain or spawn code of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileCode {
    /// Empty floor (`a`).
    Floor,
    /// Rock obstacle (`w`).
    Rock,
    /// Player spawn for the zero-based slot (`1`..`9`).
    Player(usize),
    /// Pushable trash (`t`).
    Trash,
    /// Pressure spike (`s`).
    Spike,
    /// Coin (`c`).
    Coin,
    /// Cannon facing the provided direction (`>` `<` `^` `v`).
    Cannon(Direction),
}

impl TileCode {
    /// Decodes a single character of a level row.
    #[must_use]
    pub fn from_char(code: char) -> Option<Self> {
        let tile = match code {
            'a' => Self::Floor,
            'w' => Self::Rock,
            't' => Self::Trash,
            's' => Self::Spike,
            'c' => Self::Coin,
            '>' => Self::Cannon(Direction::East),
            '<' => Self::Cannon(Direction::West),
            '^' => Self::Cannon(Direction::North),
            'v' => Self::Cannon(Direction::South),
            '1'..='9' => Self::Player(code as usize - '1' as usize),
            _ => return None,
        };
        Some(tile)
    }

    /// Encodes the tile back into its level character.
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            Self::Floor => 'a',
            Self::Rock => 'w',
            Self::Trash => 't',
            Self::Spike => 's',
            Self::Coin => 'c',
            Self::Cannon(Direction::East) => '>',
            Self::Cannon(Direction::West) => '<',
            Self::Cannon(Direction::North) => '^',
            Self::Cannon(Direction::South) => 'v',
            Self::Player(slot) => u32::try_from(slot + 1)
                .ok()
                .and_then(|digit| char::from_digit(digit, 10))
                .unwrap_or('?'),
        }
    }
}

/// Errors raised while loading a level description.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The document is not valid TOML or misses required keys.
    #[error("could not parse level description")]
    Parse(#[from] toml::de::Error),
    /// The level has no rows or an empty first row.
    #[error("level `{name}` has no cells")]
    Empty {
        /// Name of the level.
        name: String,
    },
    /// A row length differs from the first row.
    #[error("row {row} of level `{name}` has {found} cells, expected {expected}")]
    RaggedRow {
        /// Name of the level.
        name: String,
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A cell holds a character that is not a tile code.
    #[error("unknown tile code `{code}` at column {column}, row {row} of level `{name}`")]
    UnknownCode {
        /// Name of the level.
        name: String,
        /// Offending character.
        code: char,
        /// Zero-based column index.
        column: usize,
        /// Zero-based row index.
        row: usize,
    },
    /// The level does not spawn any player.
    #[error("level `{name}` has no player spawn")]
    MissingPlayer {
        /// Name of the level.
        name: String,
    },
    /// Two cells spawn the same player slot.
    #[error("level `{name}` spawns player {} more than once", .slot + 1)]
    DuplicatePlayer {
        /// Name of the level.
        name: String,
        /// Zero-based slot index.
        slot: usize,
    },
    /// Player slots are not numbered contiguously from one.
    #[error("level `{name}` skips player {}", .slot + 1)]
    MissingPlayerSlot {
        /// Name of the level.
        name: String,
        /// Zero-based index of the first missing slot.
        slot: usize,
    },
    /// A timing override is invalid.
    #[error("level `{name}` has an invalid timing override")]
    InvalidOverride {
        /// Name of the level.
        name: String,
        /// Underlying validation failure.
        #[source]
        source: ConfigError,
    },
}

/// Validated, data-driven level layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    name: String,
    columns: u32,
    rows: u32,
    tiles: Vec<TileCode>,
    player_slots: usize,
    move_speed: Option<Duration>,
    cannon_phase: Option<Duration>,
}

impl Level {
    /// Parses and validates a TOML level document.
    pub fn from_toml_str(contents: &str) -> Result<Self, LevelError> {
        let raw: RawLevel = toml::from_str(contents)?;
        let mut level = Self::from_rows(&raw.name, &raw.rows)?;

        if let Some(value) = raw.move_speed {
            let speed = config::seconds("move_speed", value).map_err(|source| {
                LevelError::InvalidOverride {
                    name: raw.name.clone(),
                    source,
                }
            })?;
            level.move_speed = Some(speed);
        }

        if let Some(value) = raw.cannon_speed {
            let phase = config::cannon_phase(value).map_err(|source| {
                LevelError::InvalidOverride {
                    name: raw.name.clone(),
                    source,
                }
            })?;
            level.cannon_phase = Some(phase);
        }

        Ok(level)
    }

    /// Builds a level from rows of tile codes, one character per cell.
    pub fn from_rows<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self, LevelError> {
        let expected = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if expected == 0 {
            return Err(LevelError::Empty {
                name: name.to_owned(),
            });
        }

        let mut tiles = Vec::with_capacity(expected * rows.len());
        let mut slots: Vec<bool> = Vec::new();
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != expected {
                return Err(LevelError::RaggedRow {
                    name: name.to_owned(),
                    row: row_index,
                    expected,
                    found,
                });
            }

            for (column, code) in row.chars().enumerate() {
                let tile = TileCode::from_char(code).ok_or_else(|| LevelError::UnknownCode {
                    name: name.to_owned(),
                    code,
                    column,
                    row: row_index,
                })?;

                if let TileCode::Player(slot) = tile {
                    if slots.len() <= slot {
                        slots.resize(slot + 1, false);
                    }
                    if slots[slot] {
                        return Err(LevelError::DuplicatePlayer {
                            name: name.to_owned(),
                            slot,
                        });
                    }
                    slots[slot] = true;
                }
                tiles.push(tile);
            }
        }

        if slots.is_empty() {
            return Err(LevelError::MissingPlayer {
                name: name.to_owned(),
            });
        }
        if let Some(slot) = slots.iter().position(|present| !present) {
            return Err(LevelError::MissingPlayerSlot {
                name: name.to_owned(),
                slot,
            });
        }

        Ok(Self {
            name: name.to_owned(),
            columns: u32::try_from(expected).unwrap_or(u32::MAX),
            rows: u32::try_from(rows.len()).unwrap_or(u32::MAX),
            tiles,
            player_slots: slots.len(),
            move_speed: None,
            cannon_phase: None,
        })
    }

    /// Human-readable level name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of selectable player slots.
    #[must_use]
    pub const fn player_slots(&self) -> usize {
        self.player_slots
    }

    /// Per-level override of the player move speed.
    #[must_use]
    pub const fn move_speed(&self) -> Option<Duration> {
        self.move_speed
    }

    /// Per-level override of the cannon phase length.
    #[must_use]
    pub const fn cannon_phase(&self) -> Option<Duration> {
        self.cannon_phase
    }

    /// Iterates over every cell in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (CellCoord, TileCode)> + '_ {
        let width = usize::try_from(self.columns).unwrap_or(usize::MAX);
        self.tiles.iter().enumerate().map(move |(index, tile)| {
            let column = i32::try_from(index % width).unwrap_or(i32::MAX);
            let row = i32::try_from(index / width).unwrap_or(i32::MAX);
            (CellCoord::new(column, row), *tile)
        })
    }

    /// Number of coins placed in the level.
    #[must_use]
    pub fn coin_count(&self) -> u32 {
        let count = self
            .tiles
            .iter()
            .filter(|tile| matches!(tile, TileCode::Coin))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLevel {
    name: String,
    #[serde(default)]
    move_speed: Option<f32>,
    #[serde(default)]
    cannon_speed: Option<f32>,
    rows: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_document_with_overrides() {
        let level = Level::from_toml_str(
            r#"
            name = "Corridor"
            move_speed = 0.25
            cannon_speed = 1.0
            rows = [
              "wwww",
              "w1cw",
              "wwww",
            ]
            "#,
        )
        .expect("level parses");

        assert_eq!(level.name(), "Corridor");
        assert_eq!((level.columns(), level.rows()), (4, 3));
        assert_eq!(level.player_slots(), 1);
        assert_eq!(level.coin_count(), 1);
        assert_eq!(level.move_speed(), Some(Duration::from_millis(250)));
        assert_eq!(level.cannon_phase(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn tiles_are_reported_in_row_major_order() {
        let level = Level::from_rows("tiny", &["1>", "sv"]).expect("level parses");
        let tiles: Vec<_> = level.tiles().collect();
        assert_eq!(
            tiles,
            vec![
                (CellCoord::new(0, 0), TileCode::Player(0)),
                (CellCoord::new(1, 0), TileCode::Cannon(Direction::East)),
                (CellCoord::new(0, 1), TileCode::Spike),
                (CellCoord::new(1, 1), TileCode::Cannon(Direction::South)),
            ]
        );
    }

    #[test]
    fn level_without_player_fails_fast() {
        let error = Level::from_rows("empty-room", &["aaa", "aca"]).expect_err("no player");
        assert!(matches!(error, LevelError::MissingPlayer { .. }));
        assert_eq!(error.to_string(), "level `empty-room` has no player spawn");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = Level::from_rows("ragged", &["1aa", "aa"]).expect_err("ragged");
        assert!(matches!(
            error,
            LevelError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn unknown_codes_report_their_location() {
        let error = Level::from_rows("typo", &["1a", "aX"]).expect_err("unknown code");
        assert!(matches!(
            error,
            LevelError::UnknownCode {
                code: 'X',
                column: 1,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn player_slots_must_be_unique_and_contiguous() {
        let duplicate = Level::from_rows("twins", &["1a1"]).expect_err("duplicate");
        assert!(matches!(duplicate, LevelError::DuplicatePlayer { slot: 0, .. }));

        let gap = Level::from_rows("gap", &["1a3"]).expect_err("gap");
        assert!(matches!(gap, LevelError::MissingPlayerSlot { slot: 1, .. }));
        assert_eq!(gap.to_string(), "level `gap` skips player 2");
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let error = Level::from_toml_str("name = \"x\"\ncannon_speed = -2.0\nrows = [\"1\"]\n")
            .expect_err("negative cannon speed");
        assert!(matches!(error, LevelError::InvalidOverride { .. }));
    }

    #[test]
    fn cannon_speed_override_must_yield_a_representable_period() {
        let error = Level::from_toml_str(
            r#"
            name = "slow"
            cannon_speed = 1e-30
            rows = ["1>"]
            "#,
        )
        .expect_err("period overflows");
        assert!(matches!(
            error,
            LevelError::InvalidOverride {
                source: ConfigError::InvalidCannonSpeed(_),
                ..
            }
        ));
    }

    #[test]
    fn tile_codes_round_trip_through_characters() {
        for code in "awtsc><^v19".chars() {
            let tile = TileCode::from_char(code).expect("known code");
            assert_eq!(tile.to_char(), code);
        }
    }
}
