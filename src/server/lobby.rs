//! Room pairing.
//!
//! The lobby pairs connections two by two and forwards moves between room members.
//! It holds no authoritative game: moves are recorded on a mirror board on a best
//! effort basis and forwarded whether or not the mirror accepted them.

use std::collections::HashMap;

use uuid::Uuid;

use super::protocol::RemoteOutMessage;
use crate::tictactoe::{Board, Player};

/// Identifier of a connection, unique for the lifetime of the server
pub type ClientId = u64;

/// Message to deliver to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: ClientId,
    pub message: RemoteOutMessage,
}

impl Outgoing {
    fn new(to: ClientId, message: RemoteOutMessage) -> Self {
        Self { to, message }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    id: Uuid,
    /// Creator of the room, plays `P1`
    first: ClientId,
    /// Joiner, plays `P2`
    second: Option<ClientId>,
    /// Relayed moves
    board: Board<Player>,
}

impl Room {
    fn new(first: ClientId) -> Self {
        Self {
            id: Uuid::new_v4(),
            first,
            second: None,
            board: Board::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn members(&self) -> impl Iterator<Item = ClientId> + '_ {
        std::iter::once(self.first).chain(self.second)
    }

    pub fn is_full(&self) -> bool {
        self.second.is_some()
    }

    pub fn board(&self) -> &Board<Player> {
        &self.board
    }

    /// Member other than `client`
    pub fn other(&self, client: ClientId) -> Option<ClientId> {
        if client == self.first {
            self.second
        } else {
            Some(self.first)
        }
    }
}

#[derive(Debug, Default)]
pub struct Lobby {
    rooms: HashMap<Uuid, Room>,
    /// Room each connection belongs to
    memberships: HashMap<ClientId, Uuid>,
    /// Room waiting for a second member
    waiting: Option<Uuid>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(&self, id: &Uuid) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_of(&self, client: ClientId) -> Option<&Room> {
        self.memberships
            .get(&client)
            .and_then(|id| self.rooms.get(id))
    }

    pub fn n_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn waiting(&self) -> Option<&Room> {
        self.waiting.as_ref().and_then(|id| self.rooms.get(id))
    }

    /// Pair `client` with the waiting connection, or open a new room
    pub fn join(&mut self, client: ClientId) -> Vec<Outgoing> {
        if let Some(room_id) = self.memberships.get(&client) {
            log::warn!("Client {client} asked to join but is already in room {room_id}");
            return vec![Outgoing::new(
                client,
                RemoteOutMessage::Error {
                    reason: format!("Already in room {room_id}"),
                },
            )];
        }

        if let Some(room) = self.waiting.take().and_then(|id| self.rooms.get_mut(&id)) {
            room.second = Some(client);
            self.memberships.insert(client, room.id);
            log::info!(
                "Client {client} joined room {room_id} against client {first}",
                room_id = room.id,
                first = room.first
            );
            let start = RemoteOutMessage::GameStart {
                start_turn: Player::P1,
            };
            return vec![
                Outgoing::new(
                    client,
                    RemoteOutMessage::GameJoined {
                        room_id: room.id,
                        player: Player::P2,
                    },
                ),
                Outgoing::new(room.first, start.clone()),
                Outgoing::new(client, start),
            ];
        }

        let room = Room::new(client);
        let room_id = room.id;
        log::info!("Client {client} created room {room_id}");
        self.rooms.insert(room_id, room);
        self.memberships.insert(client, room_id);
        self.waiting = Some(room_id);
        vec![Outgoing::new(
            client,
            RemoteOutMessage::GameCreated {
                room_id,
                player: Player::P1,
            },
        )]
    }

    /// Forward a move to the other member of the room
    pub fn make_move(
        &mut self,
        client: ClientId,
        room_id: Uuid,
        index: usize,
        player: Player,
    ) -> Vec<Outgoing> {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            log::warn!("Client {client} sent a move for unknown room {room_id}");
            return vec![Outgoing::new(
                client,
                RemoteOutMessage::Error {
                    reason: format!("Unknown room {room_id}"),
                },
            )];
        };
        if !room.members().any(|member| member == client) {
            log::warn!("Client {client} sent a move for room {room_id} it does not belong to");
            return vec![Outgoing::new(
                client,
                RemoteOutMessage::Error {
                    reason: format!("Not a member of room {room_id}"),
                },
            )];
        }

        if let Err(e) = room.board.place(index, player) {
            log::debug!("[Room {room_id}] Mirror rejected move {index} by {player}: {e}");
        }

        match room.other(client) {
            Some(other) => vec![Outgoing::new(
                other,
                RemoteOutMessage::OpponentMove { index, player },
            )],
            None => {
                log::debug!("[Room {room_id}] Move {index} dropped, no opponent yet");
                Vec::new()
            }
        }
    }

    /// Destroy the room of `client`, notifying the remaining member
    pub fn disconnect(&mut self, client: ClientId) -> Vec<Outgoing> {
        let Some(room_id) = self.memberships.remove(&client) else {
            return Vec::new();
        };
        if self.waiting == Some(room_id) {
            self.waiting = None;
        }
        let Some(room) = self.rooms.remove(&room_id) else {
            return Vec::new();
        };
        log::info!("Room {room_id} closed after client {client} left");

        match room.other(client) {
            Some(other) => {
                self.memberships.remove(&other);
                vec![Outgoing::new(other, RemoteOutMessage::OpponentLeft)]
            }
            None => Vec::new(),
        }
    }
}
