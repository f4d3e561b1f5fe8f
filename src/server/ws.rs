use anyhow::{Result, anyhow};
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt, future};

use super::{
    client::{ClientSink, ClientStream},
    connection::{AppState, handle_connection},
    protocol::{Encoding, RemoteInMessage, RemoteOutMessage},
};

/// WebSocket routes. `/ws` answers with JSON text frames, `/ws/cbor` with CBOR binary frames.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws/cbor", get(ws_cbor_handler))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Axum handler for WebSocket upgrades.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state, Encoding::Json))
}

pub async fn ws_cbor_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state, Encoding::Cbor))
}

/// Incoming frame. Text frames carry JSON, binary frames carry CBOR.
fn from_ws_message(message: Message) -> Option<Result<RemoteInMessage>> {
    match message {
        Message::Text(text) => Some(Encoding::Json.decode(text.as_str().as_bytes())),
        Message::Binary(bin) => Some(Encoding::Cbor.decode(&bin)),
        // Control frames
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
    }
}

fn to_ws_message(encoding: Encoding, message: &RemoteOutMessage) -> Result<Message> {
    let payload = encoding.encode(message)?;
    match encoding {
        Encoding::Json => Ok(Message::Text(String::from_utf8(payload.to_vec())?.into())),
        Encoding::Cbor => Ok(Message::Binary(payload)),
    }
}

/// Wraps the WebSocket in the same interface as a TCP connection
async fn handle_ws(socket: WebSocket, state: AppState, encoding: Encoding) {
    let (ws_write, ws_read) = socket.split();

    // Adapter for Stream -> RemoteInMessage
    let stream: ClientStream = Box::pin(ws_read.filter_map(|message| {
        future::ready(match message {
            Ok(message) => from_ws_message(message),
            Err(e) => Some(Err(anyhow!("WebSocket error: {e}"))),
        })
    }));

    // Adapter for Sink -> RemoteOutMessage
    let sink: ClientSink = Box::pin(SinkExt::with(ws_write, move |message: RemoteOutMessage| {
        future::ready(to_ws_message(encoding, &message))
    }));

    handle_connection(stream, sink, state).await;
}
