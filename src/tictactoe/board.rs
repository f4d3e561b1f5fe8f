use std::{fmt::Display, ops::Index};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Mark;

/// Number of cells on the board
pub const BOARD_SIZE: usize = 9;

/// Center cell
pub const CENTER: usize = 4;

/// Corner cells in enumeration order
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Side cells in enumeration order
pub const SIDES: [usize; 4] = [1, 3, 5, 7];

/// Three cells in a row, column or diagonal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line(pub [usize; 3]);

impl Line {
    pub const fn cells(&self) -> [usize; 3] {
        self.0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }
}

/// Winning lines, in the order used to break ties between simultaneous wins
#[rustfmt::skip]
pub const LINES: [Line; 8] = [
    // Rows
    Line([0, 1, 2]), Line([3, 4, 5]), Line([6, 7, 8]),
    // Columns
    Line([0, 3, 6]), Line([1, 4, 7]), Line([2, 5, 8]),
    // Diagonals
    Line([0, 4, 8]), Line([2, 4, 6]),
];

/// Diagonally opposite corner
pub const fn opposite_corner(corner: usize) -> Option<usize> {
    match corner {
        0 => Some(8),
        8 => Some(0),
        2 => Some(6),
        6 => Some(2),
        _ => None,
    }
}

/// Errors that can occur when placing a mark
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("Cell {0} outside of the board")]
    OutOfBounds(usize),
    #[error("Cell {0} is already occupied")]
    Occupied(usize),
}

/// Terminal classification of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The mark that just moved completed a line
    Won(Line),
    /// Every cell is taken and nobody completed a line
    Draw,
    /// The game goes on
    Open,
}

/// 3x3 board stored row-major: `index = row * 3 + col`
/// `None`: Empty cell
/// `Some(mark)`: Cell taken by `mark`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board<M>([Option<M>; BOARD_SIZE]);

impl<M> Board<M> {
    /// New empty board
    pub fn new() -> Self {
        Self(std::array::from_fn(|_| None))
    }

    pub fn from_cells(cells: [Option<M>; BOARD_SIZE]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Option<M>; BOARD_SIZE] {
        &self.0
    }

    /// Mark at the given cell
    pub fn get(&self, index: usize) -> Result<Option<&M>, BoardError> {
        self.0
            .get(index)
            .map(Option::as_ref)
            .ok_or(BoardError::OutOfBounds(index))
    }

    /// Whether the cell exists and holds no mark
    pub fn is_free(&self, index: usize) -> bool {
        matches!(self.0.get(index), Some(None))
    }

    /// Iterate on the indices of the empty cells, in index order
    pub fn iter_empty(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.is_none().then_some(index))
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.iter_empty().collect()
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Places a mark on an empty cell
    pub fn place(&mut self, index: usize, mark: M) -> Result<(), BoardError> {
        let cell = self.0.get_mut(index).ok_or(BoardError::OutOfBounds(index))?;
        match cell {
            // Cell is already occupied
            Some(_) => Err(BoardError::Occupied(index)),
            // Cell is empty, place the mark
            None => {
                *cell = Some(mark);
                Ok(())
            }
        }
    }
}

impl<M> Default for Board<M> {
    /// Default board is an empty board
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Index<usize> for Board<M> {
    type Output = Option<M>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<M: Mark> Board<M> {
    /// First line, in [`LINES`] order, fully occupied by `mark`
    pub fn detect(&self, mark: &M) -> Option<Line> {
        LINES.into_iter().find(|line| {
            line.cells()
                .iter()
                .all(|&index| self.0[index].as_ref() == Some(mark))
        })
    }

    /// First line, in [`LINES`] order, whose three cells hold the same mark
    pub fn winner(&self) -> Option<(&M, Line)> {
        LINES.into_iter().find_map(|line| {
            let [a, b, c] = line.cells();
            let mark = self.0[a].as_ref()?;
            (self.0[b].as_ref() == Some(mark) && self.0[c].as_ref() == Some(mark))
                .then_some((mark, line))
        })
    }

    /// Full board without any winning line
    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }

    /// Terminal check after `mark` moved. Win takes precedence over a full board.
    pub fn outcome(&self, mark: &M) -> Outcome {
        if let Some(line) = self.detect(mark) {
            Outcome::Won(line)
        } else if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::Open
        }
    }

    /// Copy of the board with `mark` placed on `index`
    pub fn with_mark(&self, index: usize, mark: &M) -> Result<Self, BoardError> {
        let mut board = self.clone();
        board.place(index, mark.clone())?;
        Ok(board)
    }

    /// Whether placing `mark` on the empty cell `index` completes a line
    pub fn completes_line(&self, index: usize, mark: &M) -> bool {
        self.with_mark(index, mark)
            .map(|board| board.detect(mark).is_some())
            .unwrap_or(false)
    }

    /// First empty cell, in index order, that completes a line for `mark`
    pub fn first_completing_cell(&self, mark: &M) -> Option<usize> {
        self.iter_empty()
            .find(|&index| self.completes_line(index, mark))
    }

    /// Number of cells holding `mark`
    pub fn count(&self, mark: &M) -> usize {
        self.0
            .iter()
            .filter(|cell| cell.as_ref() == Some(mark))
            .count()
    }
}

impl<M: Display> Display for Board<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.0.chunks(3) {
            for cell in row {
                match cell {
                    Some(mark) => write!(f, "{mark} ")?,
                    None => write!(f, "⬜ ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
