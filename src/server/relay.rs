use anyhow::{Context, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::RemoteInMessage;
use crate::tictactoe::{Player, online::MoveRelay};

/// Client side of a room: locally accepted moves become `make_move` requests
#[derive(Debug, Clone)]
pub struct RoomRelay {
    room_id: Uuid,
    player: Player,
    tx: mpsc::UnboundedSender<RemoteInMessage>,
}

impl RoomRelay {
    pub fn new(room_id: Uuid, player: Player, tx: mpsc::UnboundedSender<RemoteInMessage>) -> Self {
        Self {
            room_id,
            player,
            tx,
        }
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }
}

impl MoveRelay for RoomRelay {
    fn send_move(&mut self, index: usize) -> Result<()> {
        self.tx
            .send(RemoteInMessage::MakeMove {
                room_id: self.room_id,
                index,
                player: self.player,
            })
            .context("Connection to the relay is closed")
    }
}
