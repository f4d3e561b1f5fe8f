//! # Internal Messages Module
//!
//! Message types used between the server task and the client tasks.
//!
//! ## Message Types
//! - [`ServerMessage`]: Messages from the Server to a specific Client.
//! - [`ClientMessage`]: Requests from a Client to the Server.

use uuid::Uuid;

use super::{lobby::ClientId, protocol::RemoteOutMessage};
use crate::tictactoe::Player;

/// Message from the Server Thread to a specific Local Client Thread
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Message to pass on to the remote client
    Remote(RemoteOutMessage),
    /// Server is shutting down
    Disconnect,
}

/// Message from a Local Client Thread to the Server Thread
#[derive(Debug, Clone)]
pub enum ClientRequest {
    /// Pairing request
    JoinGame,
    /// Move to relay to the room
    MakeMove {
        room_id: Uuid,
        index: usize,
        player: Player,
    },
    /// Remote client is gone
    Disconnect,
}

/// Packaged client request with identification
///
/// Local Client Thread -> Server Thread
#[derive(Debug)]
pub struct ClientMessage {
    /// Connection that sent this message
    pub client_id: ClientId,
    /// The content of the request
    pub request: ClientRequest,
}
