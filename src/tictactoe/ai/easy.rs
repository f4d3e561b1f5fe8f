use rand::{RngCore, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::Strategy;
use crate::tictactoe::{Board, Mark};

/// Picks uniformly among the empty cells, ignoring what is on the board
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EasyStrategy;

impl<M: Mark> Strategy<M> for EasyStrategy {
    fn choose_move(
        &self,
        board: &Board<M>,
        _ai: &M,
        _opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        board.empty_cells().choose(rng).copied()
    }

    fn name(&self) -> &str {
        "Easy"
    }
}
