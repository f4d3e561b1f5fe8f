//! Emoji tic-tac-toe: rules, computer opponents and a room pairing relay
//!

/// Tic-Tac-Toe game, computer opponents and stage progression
pub mod tictactoe;

/// Room pairing relay for online matches
pub mod server;
