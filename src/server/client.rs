use std::pin::Pin;

use anyhow::{Context, Result, anyhow};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::{
    lobby::ClientId,
    messages::{ClientMessage, ClientRequest, ServerMessage},
    protocol::{RemoteInMessage, RemoteOutMessage},
};

// Transport abstraction
pub type ClientSink = Pin<Box<dyn Sink<RemoteOutMessage, Error = anyhow::Error> + Send>>;
pub type ClientStream = Pin<Box<dyn Stream<Item = Result<RemoteInMessage>> + Send>>;

pub struct Client {
    /// Connection identifier
    client_id: ClientId,
    /// Sink for messages to remote client
    sink: ClientSink,
    /// Stream of messages from remote client
    stream: ClientStream,
    /// Receiver for direct message from the server
    server_rx: mpsc::Receiver<ServerMessage>,
    /// Sender for messages to the server thread
    client_tx: mpsc::Sender<ClientMessage>,
}

impl Client {
    pub fn new(
        client_id: ClientId,
        sink: ClientSink,
        stream: ClientStream,
        server_rx: mpsc::Receiver<ServerMessage>,
        client_tx: mpsc::Sender<ClientMessage>,
    ) -> Self {
        log::debug!("[Client {client_id}] Created");

        Self {
            client_id,
            sink,
            stream,
            server_rx,
            client_tx,
        }
    }

    async fn send_remote_message(&mut self, message: RemoteOutMessage) -> Result<()> {
        log::debug!(
            "[Client {}] Sending remote message: {message:?}",
            self.client_id
        );

        self.sink
            .send(message)
            .await
            .with_context(|| "Failed to send remote message")
    }

    async fn send_request(&mut self, request: ClientRequest) -> Result<()> {
        log::debug!(
            "[Client {}] Sending request to server: {request:?}",
            self.client_id
        );

        let message = ClientMessage {
            client_id: self.client_id,
            request,
        };

        self.client_tx
            .send(message)
            .await
            .with_context(|| "Failed to send message to server")
    }

    async fn handle_remote_message(&mut self, message: RemoteInMessage) -> Result<()> {
        let request = match message {
            RemoteInMessage::JoinGame => ClientRequest::JoinGame,
            RemoteInMessage::MakeMove {
                room_id,
                index,
                player,
            } => ClientRequest::MakeMove {
                room_id,
                index,
                player,
            },
        };
        self.send_request(request)
            .await
            .with_context(|| "Unable to forward message to server")
    }

    /// Client thread main loop
    pub async fn run(&mut self) -> Result<()> {
        log::trace!("[Client {}] Task spawned", self.client_id);

        let result = loop {
            tokio::select! {

                // Incoming message from server
                server_message = self.server_rx.recv() => {
                    match server_message {
                        None => break Err(anyhow!("Server message channel closed")),
                        Some(ServerMessage::Disconnect) => {
                            log::info!("[Client {}] Disconnected by server", self.client_id);
                            break Ok(());
                        }
                        Some(ServerMessage::Remote(message)) => {
                            if let Err(e) = self.send_remote_message(message).await {
                                break Err(e);
                            }
                        }
                    }
                }

                // Incoming messages from remote client
                remote_message = self.stream.next() => {
                    match remote_message {
                        Some(Ok(message)) => {
                            log::debug!("[Client {}] Received remote message: {message:?}", self.client_id);
                            if let Err(e) = self.handle_remote_message(message).await {
                                break Err(e);
                            }
                        }
                        Some(Err(e)) => {
                            log::warn!("[Client {}] Invalid remote message: {e:#}", self.client_id);
                            let reason = format!("{e:#}");
                            if let Err(e) = self.send_remote_message(RemoteOutMessage::Error { reason }).await {
                                break Err(e);
                            }
                        }
                        None => {
                            log::info!("[Client {}] Remote client disconnected", self.client_id);
                            break Ok(());
                        }
                    }
                }
            }
        };

        // The server may already be gone when shutting down
        let _ = self.send_request(ClientRequest::Disconnect).await;

        result
    }
}

/// Run `client` until its connection ends
pub async fn run_client(mut client: Client) {
    let client_id = client.client_id;
    if let Err(e) = client.run().await {
        log::error!("[Client {client_id}] Task error: {e:?}");
    }
}
