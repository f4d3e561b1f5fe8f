use rand::{RngCore, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::{Strategy, search};
use crate::tictactoe::{
    Board, Mark,
    board::{CENTER, CORNERS, SIDES, opposite_corner},
};

/// Positional rule chain that never loses.
///
/// Rules, first applicable wins:
/// 1. complete a line
/// 2. block the opponent's line
/// 3. take the center
/// 4. take the corner opposite an opponent corner
/// 5. take a random empty corner
/// 6. take a random empty side
///
/// Rules 3 to 6 only consider cells the game tree proves optimal, which keeps the
/// chain from walking into the opposite-corners fork.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImpossibleStrategy;

impl ImpossibleStrategy {
    fn positional_move<M: Mark>(
        board: &Board<M>,
        ai: &M,
        opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let scores = search::score_moves(board, ai, opponent);
        let best = scores.iter().flatten().max().copied()?;
        let optimal = |index: usize| scores[index] == Some(best);

        // Center
        if optimal(CENTER) {
            return Some(CENTER);
        }

        // Opposite corner
        let opposite = CORNERS.into_iter().find_map(|corner| {
            let across = opposite_corner(corner)?;
            (board[corner].as_ref() == Some(opponent) && optimal(across)).then_some(across)
        });
        if opposite.is_some() {
            return opposite;
        }

        // Any corner, then any side
        [CORNERS, SIDES].into_iter().find_map(|cells| {
            cells
                .into_iter()
                .filter(|&index| optimal(index))
                .collect::<Vec<_>>()
                .choose(&mut *rng)
                .copied()
        })
    }
}

impl<M: Mark> Strategy<M> for ImpossibleStrategy {
    fn choose_move(
        &self,
        board: &Board<M>,
        ai: &M,
        opponent: &M,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        board
            .first_completing_cell(ai)
            .or_else(|| board.first_completing_cell(opponent))
            .or_else(|| Self::positional_move(board, ai, opponent, rng))
            // Unreachable with a non-empty board, kept as a last resort
            .or_else(|| board.iter_empty().next())
    }

    fn name(&self) -> &str {
        "Impossible"
    }
}
