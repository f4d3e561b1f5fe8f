use rand::{Rng, RngCore, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::tictactoe::{Board, Mark};

/// Chance of looking for a winning or blocking cell before falling back to a random one
pub const DEFAULT_STRATEGIC_PROBABILITY: f64 = 0.75;

/// Competent but beatable: wins or blocks most of the time, otherwise plays at random
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalStrategy {
    /// Probability in `[0, 1]` of attempting a strategic move
    #[serde(default = "default_strategic_probability")]
    pub strategic_probability: f64,
}

fn default_strategic_probability() -> f64 {
    DEFAULT_STRATEGIC_PROBABILITY
}

impl NormalStrategy {
    pub fn new(strategic_probability: f64) -> Self {
        Self {
            strategic_probability,
        }
    }

    /// Out of range probabilities fall back to the default
    fn probability(&self) -> f64 {
        if (0.0..=1.0).contains(&self.strategic_probability) {
            self.strategic_probability
        } else {
            DEFAULT_STRATEGIC_PROBABILITY
        }
    }

    /// Winning cell for `ai`, else blocking cell against `opponent`, first in index order
    pub fn strategic_move<M: Mark>(board: &Board<M>, ai: &M, opponent: &M) -> Option<usize> {
        board
            .first_completing_cell(ai)
            .or_else(|| board.first_completing_cell(opponent))
    }
}

impl Default for NormalStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_STRATEGIC_PROBABILITY)
    }
}

impl<M: Mark> Strategy<M> for NormalStrategy {
    fn choose_move(
        &self,
        board: &Board<M>,
        ai: &M,
        opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if rng.random_bool(self.probability()) {
            if let Some(index) = Self::strategic_move(board, ai, opponent) {
                return Some(index);
            }
        }

        board.empty_cells().choose(rng).copied()
    }

    fn name(&self) -> &str {
        "Normal"
    }
}
