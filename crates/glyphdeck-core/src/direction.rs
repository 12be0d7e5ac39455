//! Fall direction of rain columns.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which way a rain column moves between draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Down,
    Up,
}

impl Direction {
    /// Row delta applied on each draw.
    pub fn step(self) -> f32 {
        match self {
            Direction::Down => 1.0,
            Direction::Up => -1.0,
        }
    }
}

/// How new columns pick their direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectionPolicy {
    /// Every column falls down.
    #[default]
    AlwaysDown,
    /// Each column flips a coin between down and up.
    Mixed,
}

impl DirectionPolicy {
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> Direction {
        match self {
            DirectionPolicy::AlwaysDown => Direction::Down,
            DirectionPolicy::Mixed if rng.random_bool(0.5) => Direction::Up,
            DirectionPolicy::Mixed => Direction::Down,
        }
    }
}
