//! Dice expression evaluation.
//!
//! Supports the notation found in creature stat blocks: `NdM`, `NdM+K`,
//! `NdM-K` (case-insensitive) and bare integer literals such as `"7"`.
//!
//! Malformed expressions are never fatal to an encounter. Callers that sit on
//! top of catalog data use [`DiceRoller::evaluate_or_zero`], which logs the
//! problem and treats the expression as `0`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the dice count of a single expression.
pub const MAX_DICE: u32 = 1000;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice expression: {0:?}")]
    InvalidDiceExpression(String),
}

/// A parsed dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceExpression {
    /// `count` dice with `sides` faces each, plus a flat modifier.
    Roll { count: u32, sides: u32, modifier: i32 },
    /// A bare integer literal.
    Flat(i32),
}

impl DiceExpression {
    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_ascii_lowercase();
        let invalid = || DiceError::InvalidDiceExpression(notation.clone());

        if is_signed_integer(&notation) {
            return notation
                .parse::<i32>()
                .map(DiceExpression::Flat)
                .map_err(|_| invalid());
        }

        let (count_str, rest) = notation.split_once('d').ok_or_else(invalid)?;
        let (sides_str, modifier_str) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => rest.split_at(pos),
            None => (rest, ""),
        };

        if !is_unsigned_integer(count_str) || !is_unsigned_integer(sides_str) {
            return Err(invalid());
        }
        let count: u32 = count_str.parse().map_err(|_| invalid())?;
        let sides: u32 = sides_str.parse().map_err(|_| invalid())?;
        if count == 0 || sides == 0 || count > MAX_DICE {
            return Err(invalid());
        }

        let modifier = if modifier_str.is_empty() {
            0
        } else if is_signed_integer(modifier_str) {
            modifier_str.parse::<i32>().map_err(|_| invalid())?
        } else {
            return Err(invalid());
        };

        Ok(DiceExpression::Roll {
            count,
            sides,
            modifier,
        })
    }

    /// Lowest total this expression can produce.
    pub fn min(&self) -> i32 {
        match *self {
            DiceExpression::Roll {
                count, modifier, ..
            } => modifier.saturating_add(count as i32),
            DiceExpression::Flat(value) => value,
        }
    }

    /// Highest total this expression can produce.
    pub fn max(&self) -> i32 {
        match *self {
            DiceExpression::Roll {
                count,
                sides,
                modifier,
            } => (count as i64 * sides as i64 + modifier as i64).min(i32::MAX as i64) as i32,
            DiceExpression::Flat(value) => value,
        }
    }

    /// Roll the expression with the given random source.
    pub fn roll_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        match *self {
            DiceExpression::Roll {
                count,
                sides,
                modifier,
            } => {
                let rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=sides)).collect();
                let sum: i64 = rolls.iter().map(|&r| r as i64).sum();
                let total = (sum + modifier as i64).clamp(i32::MIN as i64, i32::MAX as i64);
                RollResult {
                    expression: *self,
                    rolls,
                    modifier,
                    total: total as i32,
                }
            }
            DiceExpression::Flat(value) => RollResult {
                expression: *self,
                rolls: Vec::new(),
                modifier: value,
                total: value,
            },
        }
    }

    /// Roll with the thread-local random source.
    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }
}

fn is_unsigned_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_signed_integer(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    is_unsigned_integer(digits)
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DiceExpression::Roll {
                count,
                sides,
                modifier,
            } => {
                if modifier > 0 {
                    write!(f, "{count}d{sides}+{modifier}")
                } else if modifier < 0 {
                    write!(f, "{count}d{sides}{modifier}")
                } else {
                    write!(f, "{count}d{sides}")
                }
            }
            DiceExpression::Flat(value) => write!(f, "{value}"),
        }
    }
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        if self.rolls.is_empty() {
            return self.total.to_string();
        }
        let dice = format!(
            "[{}]",
            self.rolls
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        match self.modifier {
            0 => dice,
            m if m > 0 => format!("{dice} + {m}"),
            m => format!("{dice} - {}", m.unsigned_abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}

/// The random source shared by everything an encounter rolls.
///
/// Seeded exactly once when the owning engine is created.
#[derive(Debug, Clone)]
pub struct DiceRoller {
    rng: StdRng,
}

impl DiceRoller {
    /// A roller with a fixed seed; identical seeds replay identical rolls.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A roller seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Roll a parsed expression.
    pub fn roll(&mut self, expression: &DiceExpression) -> RollResult {
        expression.roll_with_rng(&mut self.rng)
    }

    /// Roll a single die with `sides` faces.
    pub fn die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }

    /// Roll a d20.
    pub fn d20(&mut self) -> i32 {
        self.die(20) as i32
    }

    /// Parse and roll a notation string.
    pub fn evaluate(&mut self, notation: &str) -> Result<i32, DiceError> {
        let expression = DiceExpression::parse(notation)?;
        let result = self.roll(&expression);
        tracing::trace!(notation, total = result.total, "rolled {}", result);
        Ok(result.total)
    }

    /// Like [`DiceRoller::evaluate`], but a malformed expression counts as `0`.
    pub fn evaluate_or_zero(&mut self, notation: &str) -> i32 {
        self.evaluate(notation).unwrap_or_else(|err| {
            tracing::warn!(%err, "treating malformed dice expression as 0");
            0
        })
    }
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Convenience function to roll dice from a notation string.
pub fn roll(notation: &str) -> Result<RollResult, DiceError> {
    let expr = DiceExpression::parse(notation)?;
    Ok(expr.roll())
}
