//! # Connection Module
//!
//! Registration of new TCP and WebSocket connections with the server task.
//! Every connection gets a fresh [`ClientId`], a channel from the server and a
//! [`Client`] task for the rest of its life.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::codec::Framed;

use super::{
    LOCAL_CHANNEL_CAPACITY, MainThreadMessage,
    client::{Client, ClientSink, ClientStream, run_client},
    lobby::ClientId,
    messages::{ClientMessage, ServerMessage},
    protocol::{Encoding, ServerCodec},
};

/// Shared state for the application
/// This state is cloned and passed to new connections (both TCP and WebSocket)
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel to send messages to the main server loop
    pub main_tx: mpsc::Sender<MainThreadMessage>,
    /// Channel to send messages from Clients to the Server
    pub client_msg_tx: mpsc::Sender<ClientMessage>,
    /// Source of connection identifiers
    next_client_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(
        main_tx: mpsc::Sender<MainThreadMessage>,
        client_msg_tx: mpsc::Sender<ClientMessage>,
    ) -> Self {
        Self {
            main_tx,
            client_msg_tx,
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Wrap a TCP stream in length delimited framing
pub fn tcp_transport(stream: TcpStream, encoding: Encoding) -> (ClientStream, ClientSink) {
    let framed = Framed::new(stream, ServerCodec::new(encoding));
    let (write, read) = framed.split();
    let sink: ClientSink = Box::pin(write);
    // Payload errors are items, transport errors end up in the same place
    let stream: ClientStream = Box::pin(read.map(|frame| frame.and_then(|request| request)));
    (stream, sink)
}

/// Register a connection with the server and serve it until it closes
pub async fn handle_connection(stream: ClientStream, mut sink: ClientSink, app_state: AppState) {
    let client_id = app_state.next_client_id();
    log::info!("New connection: client {client_id}");

    // Server thread -> Client thread
    let (server_tx, server_rx) = mpsc::channel::<ServerMessage>(LOCAL_CHANNEL_CAPACITY);

    // The server learns about the client before the client can send anything
    if let Err(e) = app_state
        .main_tx
        .send(MainThreadMessage::ClientConnected(client_id, server_tx))
        .await
    {
        log::error!("Failed to notify server of connection: {e}");
        let _ = sink.close().await;
        return;
    }

    let client = Client::new(client_id, sink, stream, server_rx, app_state.client_msg_tx);
    run_client(client).await;
}
