//! Computer opponents
//!
//! Every strategy maps a board plus the mark assignment to an empty cell index,
//! or `None` when the board is full. Randomness is always injected so callers
//! can seed it.

use std::{fmt::Display, str::FromStr};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Board, Mark};

/// Uniformly random moves
pub mod easy;

/// Deterministic rule chain backed by a game-tree search
pub mod impossible;

/// Coin-flip between win/block and random moves
pub mod normal;

/// Game-tree evaluation
mod search;

pub use easy::EasyStrategy;
pub use impossible::ImpossibleStrategy;
pub use normal::NormalStrategy;

/// Move selection policy
pub trait Strategy<M: Mark> {
    /// Select an empty cell for `ai`, or `None` if the board is full
    fn choose_move(
        &self,
        board: &Board<M>,
        ai: &M,
        opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize>;

    /// Display name
    fn name(&self) -> &str;
}

/// Difficulty tag accepted by [`compute_ai_move`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    /// Alias of [`Difficulty::Normal`]
    Hard,
    Impossible,
}

impl Difficulty {
    pub const fn variants() -> [Difficulty; 4] {
        [
            Difficulty::Easy,
            Difficulty::Normal,
            Difficulty::Hard,
            Difficulty::Impossible,
        ]
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid difficulty level: {0}")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::variants()
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

/// Configured instance of every strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Strategies {
    #[serde(default)]
    pub easy: EasyStrategy,
    #[serde(default)]
    pub normal: NormalStrategy,
    #[serde(default)]
    pub impossible: ImpossibleStrategy,
}

impl Strategies {
    /// Strategy played for a difficulty tag
    pub fn for_difficulty<M: Mark>(&self, difficulty: Difficulty) -> &dyn Strategy<M> {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Normal | Difficulty::Hard => &self.normal,
            Difficulty::Impossible => &self.impossible,
        }
    }

    pub fn choose_move<M: Mark>(
        &self,
        board: &Board<M>,
        difficulty: Difficulty,
        ai: &M,
        opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let strategy = self.for_difficulty::<M>(difficulty);
        let index = strategy.choose_move(board, ai, opponent, rng);
        log::trace!(
            "{name} strategy chose {index:?}",
            name = strategy.name()
        );
        index
    }
}

/// Dispatch to the default-configured strategy for `difficulty`
pub fn compute_ai_move<M: Mark>(
    board: &Board<M>,
    difficulty: Difficulty,
    ai: &M,
    opponent: &M,
    rng: &mut dyn RngCore,
) -> Option<usize> {
    Strategies::default().choose_move(board, difficulty, ai, opponent, rng)
}
