use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Required number of leading `'0'` hex characters in a mined block's hash.
///
/// Always within `0..=MAX_DIFFICULTY`; a 64-character digest can never carry
/// more zeros than that, so larger values would make mining spin forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub const ZERO: Difficulty = Difficulty(0);

    pub fn new(value: u32) -> Result<Self> {
        if value > MAX_DIFFICULTY {
            return Err(ChainError::DifficultyOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The hash prefix a block must start with, e.g. `"000"` for 3.
    pub fn target_prefix(self) -> String {
        "0".repeat(self.0 as usize)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ChainError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> u32 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings a chain is created with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub difficulty: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<Difficulty> {
        Difficulty::new(self.difficulty)
    }
}
