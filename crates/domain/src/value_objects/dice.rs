//! Dice formulas and roll results
//!
//! Roll requests arrive as a bare die size (`dice_type: 20`); monster stat
//! blocks carry hit-point formulas such as "2d6+3".

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("Empty dice formula")]
    Empty,
    /// Expected XdY, XdY+Z or XdY-Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceFormula {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Result<Self, DiceParseError> {
        if count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if sides < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    /// A single die of the given size, as carried by a roll request.
    pub fn single(sides: u32) -> Result<Self, DiceParseError> {
        Self::new(1, sides, 0)
    }

    /// Parse "XdY", "XdY+Z", "XdY-Z" or the "dY" shorthand.
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count_str, rest) = input.split_once('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count_str))
            })?
        };

        let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(0) => {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    rest
                )))
            }
            Some(pos) => {
                let (sides_str, signed) = rest.split_at(pos);
                let modifier: i32 = signed.parse().map_err(|_| {
                    DiceParseError::InvalidFormat(format!("Invalid modifier: '{}'", signed))
                })?;
                (sides_str, modifier)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", sides_str))
        })?;

        Self::new(count, sides, modifier)
    }

    /// Roll using the supplied die roller.
    ///
    /// `roll_die(sides)` must return a value in `1..=sides`. Randomness is
    /// injected so the domain stays deterministic under test.
    pub fn roll_with(&self, mut roll_die: impl FnMut(u32) -> u32) -> DiceRollResult {
        let rolls: Vec<i32> = (0..self.count)
            .map(|_| roll_die(self.sides).clamp(1, self.sides) as i32)
            .collect();
        let dice_total: i32 = rolls.iter().sum();

        DiceRollResult {
            formula: *self,
            rolls,
            total: dice_total + self.modifier,
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

/// Result of rolling a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRollResult {
    pub formula: DiceFormula,
    pub rolls: Vec<i32>,
    pub total: i32,
}

impl DiceRollResult {
    /// e.g. "1d20(14) + 5 = 19" or "2d6[4, 5] = 9"
    pub fn breakdown(&self) -> String {
        let dice = format!("{}d{}", self.formula.count, self.formula.sides);
        let rolls = match self.rolls.as_slice() {
            [single] => format!("{}({})", dice, single),
            many => {
                let joined: Vec<String> = many.iter().map(|r| r.to_string()).collect();
                format!("{}[{}]", dice, joined.join(", "))
            }
        };

        match self.formula.modifier {
            0 => format!("{} = {}", rolls, self.total),
            m if m > 0 => format!("{} + {} = {}", rolls, m, self.total),
            m => format!("{} - {} = {}", rolls, -m, self.total),
        }
    }
}
