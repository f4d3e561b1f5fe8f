use crate::tictactoe::{
    Board, Mark,
    board::{BOARD_SIZE, LINES},
};

/// Compact board seen from the side to move: own marks `1`, opponent marks `-1`,
/// empty `0`, anything else `2` (never part of a line for either side)
type Cells = [i8; BOARD_SIZE];

const AI: i8 = 1;
const OPPONENT: i8 = -1;
const EMPTY: i8 = 0;
const FOREIGN: i8 = 2;

fn encode<M: Mark>(board: &Board<M>, ai: &M, opponent: &M) -> Cells {
    std::array::from_fn(|index| match &board[index] {
        None => EMPTY,
        Some(mark) if mark == ai => AI,
        Some(mark) if mark == opponent => OPPONENT,
        Some(_) => FOREIGN,
    })
}

fn wins(cells: &Cells, side: i8) -> bool {
    LINES
        .iter()
        .any(|line| line.cells().iter().all(|&index| cells[index] == side))
}

/// Game value for `side` to move: `1` win, `0` draw, `-1` loss
fn negamax(cells: &mut Cells, side: i8, mut alpha: i8, beta: i8) -> i8 {
    let mut best: Option<i8> = None;
    for index in 0..BOARD_SIZE {
        if cells[index] != EMPTY {
            continue;
        }
        cells[index] = side;
        let value = if wins(cells, side) {
            1
        } else {
            -negamax(cells, -side, -beta, -alpha)
        };
        cells[index] = EMPTY;

        best = Some(best.map_or(value, |best| best.max(value)));
        alpha = alpha.max(value);
        if alpha >= beta {
            break;
        }
    }
    // Full board
    best.unwrap_or(0)
}

/// Exact game value of every empty cell for `ai` to play, indexed by cell
pub(super) fn score_moves<M: Mark>(
    board: &Board<M>,
    ai: &M,
    opponent: &M,
) -> [Option<i8>; BOARD_SIZE] {
    let mut cells = encode(board, ai, opponent);
    let mut scores = [None; BOARD_SIZE];
    for index in 0..BOARD_SIZE {
        if cells[index] != EMPTY {
            continue;
        }
        cells[index] = AI;
        scores[index] = Some(if wins(&cells, AI) {
            1
        } else {
            -negamax(&mut cells, OPPONENT, -1, 1)
        });
        cells[index] = EMPTY;
    }
    scores
}
