//! Tic-Tac-Toe
//! Rules, turn state machine and computer opponents for a 3x3 board played with arbitrary marks

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// Computer opponents
pub mod ai;

/// Board representation and win/draw detection
pub mod board;

/// Online match against a remote peer
pub mod online;

/// Stage progression across difficulty tiers
pub mod progress;

/// Turn state machine
pub mod session;

/// Simulated thinking latency
pub mod think;

pub use board::{Board, BoardError, LINES, Line, Outcome};
pub use session::{GameSession, MoveError, Opponent, SetupError};

/// Anything that can be drawn in a cell.
/// Marks are only ever compared for equality, their content is never interpreted.
pub trait Mark: Clone + PartialEq + Debug {}

impl<T: Clone + PartialEq + Debug> Mark for T {}

/// The two seats at the table. `P1` always opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    #[serde(rename = "p1")]
    P1,
    #[serde(rename = "p2")]
    P2,
}

impl Player {
    /// List all player variants
    pub const fn variants() -> [Player; 2] {
        [Player::P1, Player::P2]
    }

    pub const fn opposite(&self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    pub const fn index(&self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::P1 => write!(f, "Player 1"),
            Player::P2 => write!(f, "Player 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GameResult {
    Victory { player: Player, line: Line },
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Marks are being chosen
    Setup,
    /// Game is ongoing, waiting for the given player
    Playing(Player),
    /// Game is over
    Finished(GameResult),
}

impl GameStatus {
    pub fn is_playing(&self) -> bool {
        matches!(self, GameStatus::Playing(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, GameStatus::Finished(_))
    }

    /// Player expected to move, if any
    pub fn turn(&self) -> Option<Player> {
        match self {
            GameStatus::Playing(player) => Some(*player),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        match self {
            GameStatus::Finished(result) => Some(*result),
            _ => None,
        }
    }
}

impl Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Setup => write!(f, "Choosing marks"),
            GameStatus::Playing(player) => write!(f, "Current player: {player}"),
            GameStatus::Finished(GameResult::Victory { player, line }) => {
                write!(f, "Game finished! {player} wins on {:?}!", line.cells())
            }
            GameStatus::Finished(GameResult::Draw) => write!(f, "Game finished! It's a draw!"),
        }
    }
}
