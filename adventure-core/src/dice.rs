//! Dice rolling.
//!
//! Every random decision the engine makes goes through the [`Dice`] trait:
//! die rolls, target picks, initiative. Production code uses [`RngDice`];
//! tests replay a fixed sequence with [`crate::testing::ScriptedDice`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Standard die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }

    /// Parse damage-dice notation: `d8`, `1d8` or `D8`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;
        let count = &notation[..d_pos];
        if !count.is_empty() && count != "1" {
            return Err(DiceError::InvalidNotation(notation.clone()));
        }

        let sides: u32 = notation[d_pos + 1..]
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;

        DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

impl FromStr for DieType {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DieType::parse(s)
    }
}

impl TryFrom<String> for DieType {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DieType::parse(&value)
    }
}

impl From<DieType> for String {
    fn from(die: DieType) -> Self {
        die.to_string()
    }
}

/// Source of randomness for the engine.
pub trait Dice {
    /// Roll one die with `sides` faces, yielding a value in `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;

    /// Pick an index in `0..len`. Callers never pass `len == 0`.
    fn pick(&mut self, len: usize) -> usize;

    /// Roll a standard die.
    fn roll_die(&mut self, die: DieType) -> u32 {
        self.roll(die.sides())
    }
}

/// [`Dice`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R: Rng> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Deterministic dice: the same seed replays the same adventure.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Dice for RngDice<R> {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(1))
    }

    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.rng.gen_range(0..len)
        }
    }
}

/// Outcome of the d10 roll made before every damaging attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitRoll {
    Miss,
    Hit,
    Critical,
}

impl HitRoll {
    /// 1-2 miss, 3-9 hit, 10 critical.
    pub fn from_d10(roll: u32) -> Self {
        match roll {
            0..=2 => HitRoll::Miss,
            10.. => HitRoll::Critical,
            _ => HitRoll::Hit,
        }
    }

    pub fn roll(dice: &mut dyn Dice) -> Self {
        Self::from_d10(dice.roll_die(DieType::D10))
    }

    pub fn multiplier(&self) -> i32 {
        match self {
            HitRoll::Miss => 0,
            HitRoll::Hit => 1,
            HitRoll::Critical => 2,
        }
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, HitRoll::Miss)
    }
}
