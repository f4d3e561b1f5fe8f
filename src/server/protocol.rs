//! # Protocol Module
//!
//! External messages exchanged with remote clients over TCP or WebSocket.
//!
//! ## Messages
//! - [`RemoteInMessage`]: Messages sent from Remote Client to Server.
//! - [`RemoteOutMessage`]: Messages sent from Server to Remote Client.
//!
//! ## Codecs
//! `tokio_util` codecs ([`ServerCodec`], [`ClientCodec`]) frame every message with a
//! length prefix. Payloads are JSON or CBOR, see [`Encoding`].

use std::fmt::Display;

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};
use uuid::Uuid;

use crate::tictactoe::Player;

/// Maximum length of a remote message in bytes
pub const REMOTE_MESSAGE_LENGTH: usize = 4 * 1024;

/// Messages sent from a Remote Client to the Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase", tag = "type")]
pub enum RemoteInMessage {
    /// Request pairing with the next waiting client
    JoinGame,
    /// Move to relay to the other member of the room
    MakeMove {
        room_id: Uuid,
        index: usize,
        player: Player,
    },
}

/// Messages sent from the Server to a Remote Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", rename_all_fields = "camelCase", tag = "type")]
pub enum RemoteOutMessage {
    /// New room created, waiting for an opponent
    GameCreated { room_id: Uuid, player: Player },
    /// Joined a waiting room
    GameJoined { room_id: Uuid, player: Player },
    /// Both seats are taken
    GameStart { start_turn: Player },
    /// Move made by the other member of the room
    OpponentMove { index: usize, player: Player },
    /// The other member of the room disconnected
    OpponentLeft,
    /// Request could not be handled
    Error { reason: String },
}

/// Payload serialization format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Cbor,
}

impl Encoding {
    pub fn encode<T: Serialize>(&self, item: &T) -> Result<Bytes> {
        match self {
            Encoding::Json => serde_json::to_vec(item)
                .map(Bytes::from)
                .context("Failed to serialize JSON message"),
            Encoding::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(item, &mut buf)
                    .context("Failed to serialize CBOR message")?;
                Ok(Bytes::from(buf))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Encoding::Json => {
                serde_json::from_slice(bytes).context("Failed to deserialize JSON message")
            }
            Encoding::Cbor => {
                ciborium::from_reader(bytes).context("Failed to deserialize CBOR message")
            }
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Json => write!(f, "json"),
            Encoding::Cbor => write!(f, "cbor"),
        }
    }
}

fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(REMOTE_MESSAGE_LENGTH)
        .new_codec()
}

// Codecs

/// Server-side Codec
///
/// Decodes `RemoteInMessage` and encodes `RemoteOutMessage`.
/// Undecodable payloads are yielded as `Err` items so the connection survives them,
/// only framing and I/O failures end the stream.
#[derive(Debug)]
pub struct ServerCodec {
    /// Underlying framing codec
    delegate: LengthDelimitedCodec,
    /// Payload format
    encoding: Encoding,
}

impl ServerCodec {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            delegate: frame_codec(),
            encoding,
        }
    }
}

impl Default for ServerCodec {
    fn default() -> Self {
        Self::new(Encoding::default())
    }
}

impl Decoder for ServerCodec {
    type Item = Result<RemoteInMessage>;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Decode the frame first
        let bytes = match self.delegate.decode(src)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        // Deserialize the payload
        Ok(Some(self.encoding.decode(&bytes)))
    }
}

impl Encoder<RemoteOutMessage> for ServerCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: RemoteOutMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = self.encoding.encode(&item)?;
        self.delegate
            .encode(payload, dst)
            .context("Failed to frame message")
    }
}

/// Client-side Codec
///
/// Decodes `RemoteOutMessage` and encodes `RemoteInMessage`.
#[derive(Debug)]
pub struct ClientCodec {
    delegate: LengthDelimitedCodec,
    encoding: Encoding,
}

impl ClientCodec {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            delegate: frame_codec(),
            encoding,
        }
    }
}

impl Default for ClientCodec {
    fn default() -> Self {
        Self::new(Encoding::default())
    }
}

impl Decoder for ClientCodec {
    type Item = RemoteOutMessage;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let bytes = match self.delegate.decode(src)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        self.encoding.decode(&bytes).map(Some)
    }
}

impl Encoder<RemoteInMessage> for ClientCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: RemoteInMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = self.encoding.encode(&item)?;
        self.delegate
            .encode(payload, dst)
            .context("Failed to frame message")
    }
}
