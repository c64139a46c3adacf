//! Parser for the scripted intent sequences accepted by `run --script`.

use anyhow::{bail, Context, Result};
use tick_tactics_core::Direction;

/// Single scripted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Select the zero-based player slot.
    Select(usize),
    /// Queue a move for the selected player.
    Move(Direction),
    /// Queue a push for the selected player.
    Push(Direction),
    /// Remove the selected player's last queued action.
    Undo,
    /// Clear the selected player's queue.
    Clear,
    /// Toggle the pause flag.
    TogglePause,
    /// Advance the simulation by the provided number of ticks.
    Wait(u32),
}

/// Parses whitespace- or comma-separated tokens into steps.
pub(crate) fn parse(source: &str) -> Result<Vec<Step>> {
    source
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> Result<Step> {
    if let Some(count) = token.strip_prefix('t') {
        let ticks = count
            .parse::<u32>()
            .with_context(|| format!("invalid tick count in script token `{token}`"))?;
        return Ok(Step::Wait(ticks));
    }
    if let Some(key) = token.strip_prefix('p').filter(|key| !key.is_empty()) {
        return match direction(key) {
            Some(direction) => Ok(Step::Push(direction)),
            None => bail!("unknown push direction in script token `{token}`"),
        };
    }

    let step = match token {
        "x" => Step::Undo,
        "c" => Step::Clear,
        "p" => Step::TogglePause,
        _ => {
            if let Some(direction) = direction(token) {
                Step::Move(direction)
            } else if let Some(slot) = slot(token) {
                Step::Select(slot)
            } else {
                bail!("unknown script token `{token}`");
            }
        }
    };
    Ok(step)
}

fn direction(key: &str) -> Option<Direction> {
    match key {
        "w" => Some(Direction::North),
        "a" => Some(Direction::West),
        "s" => Some(Direction::South),
        "d" => Some(Direction::East),
        _ => None,
    }
}

fn slot(key: &str) -> Option<usize> {
    let mut chars = key.chars();
    let digit = chars.next()?.to_digit(10)?;
    if chars.next().is_some() || digit == 0 {
        return None;
    }
    usize::try_from(digit - 1).ok()
}
