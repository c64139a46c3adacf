//! Timing configuration shared by every level.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Timing constants driving every timed action.
#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Seconds a player needs to cross one tile.
    pub move_speed: Duration,
    /// Duration of a player's push before it shoves its target.
    pub push_duration: Duration,
    /// Duration of the forced relocation applied to a pushed entity.
    pub pushed_duration: Duration,
    /// Duration of a full-size explosion.
    pub explode_duration: Duration,
    /// Duration of a fireball-sized explosion.
    pub explode_small_duration: Duration,
    /// Spike warm-up phase.
    pub spike_prep: Duration,
    /// Spike raised phase.
    pub spike_up: Duration,
    /// Spike retraction phase.
    pub spike_down: Duration,
    /// Spike rest phase.
    pub spike_idle: Duration,
    /// Length of each cannon phase, read from the `cannon_speed` key as
    /// `1 / cannon_speed` seconds.
    pub cannon_phase: Duration,
    /// Seconds a fireball needs to cross one tile.
    pub fireball_step: Duration,
    /// Delay between collecting the last coin and finishing the level.
    pub win_delay: Duration,
}

impl GameConfig {
    /// Parses a configuration document. Every key is optional.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)?;
        raw.validate()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_speed: Duration::from_millis(500),
            push_duration: Duration::from_millis(500),
            pushed_duration: Duration::from_millis(250),
            explode_duration: Duration::from_millis(500),
            explode_small_duration: Duration::from_millis(250),
            spike_prep: Duration::from_millis(500),
            spike_up: Duration::from_millis(500),
            spike_down: Duration::from_millis(500),
            spike_idle: Duration::from_secs(1),
            cannon_phase: Duration::from_secs(2),
            fireball_step: Duration::from_millis(250),
            win_delay: Duration::from_secs(2),
        }
    }
}

/// Errors raised while loading a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has unexpected keys.
    #[error("could not parse game configuration")]
    Parse(#[from] toml::de::Error),
    /// A duration was negative, infinite or not a number.
    #[error("`{key}` must be a finite, non-negative number of seconds, got {value}")]
    InvalidSeconds {
        /// Offending configuration key.
        key: &'static str,
        /// Value found in the document.
        value: f32,
    },
    /// The cannon speed must be positive and yield a representable phase.
    #[error("`cannon_speed` must be a positive number with a finite period, got {0}")]
    InvalidCannonSpeed(f32),
}

pub(crate) fn seconds(key: &'static str, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidSeconds { key, value })
}

/// Converts a cannon speed into the length of one cannon phase.
pub(crate) fn cannon_phase(speed: f32) -> Result<Duration, ConfigError> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(ConfigError::InvalidCannonSpeed(speed));
    }
    Duration::try_from_secs_f32(1.0 / speed).map_err(|_| ConfigError::InvalidCannonSpeed(speed))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    move_speed: Option<f32>,
    push_duration: Option<f32>,
    pushed_duration: Option<f32>,
    explode_duration: Option<f32>,
    explode_small_duration: Option<f32>,
    spike_prep: Option<f32>,
    spike_up: Option<f32>,
    spike_down: Option<f32>,
    spike_idle: Option<f32>,
    cannon_speed: Option<f32>,
    fireball_step: Option<f32>,
    win_delay: Option<f32>,
}

impl RawConfig {
    fn validate(self) -> Result<GameConfig, ConfigError> {
        let defaults = GameConfig::default();
        let pick = |key: &'static str, value: Option<f32>, fallback: Duration| match value {
            Some(value) => seconds(key, value),
            None => Ok(fallback),
        };

        Ok(GameConfig {
            move_speed: pick("move_speed", self.move_speed, defaults.move_speed)?,
            push_duration: pick("push_duration", self.push_duration, defaults.push_duration)?,
            pushed_duration: pick(
                "pushed_duration",
                self.pushed_duration,
                defaults.pushed_duration,
            )?,
            explode_duration: pick(
                "explode_duration",
                self.explode_duration,
                defaults.explode_duration,
            )?,
            explode_small_duration: pick(
                "explode_small_duration",
                self.explode_small_duration,
                defaults.explode_small_duration,
            )?,
            spike_prep: pick("spike_prep", self.spike_prep, defaults.spike_prep)?,
            spike_up: pick("spike_up", self.spike_up, defaults.spike_up)?,
            spike_down: pick("spike_down", self.spike_down, defaults.spike_down)?,
            spike_idle: pick("spike_idle", self.spike_idle, defaults.spike_idle)?,
            cannon_phase: match self.cannon_speed {
                Some(value) => cannon_phase(value)?,
                None => defaults.cannon_phase,
            },
            fireball_step: pick("fireball_step", self.fireball_step, defaults.fireball_step)?,
            win_delay: pick("win_delay", self.win_delay, defaults.win_delay)?,
        })
    }
}
