use std::collections::{HashMap, VecDeque, hash_map};

use anyhow::{Result, anyhow};
use tokio::sync::mpsc::{self, error::TrySendError};

pub mod client;
pub mod connection;
pub mod lobby;
pub mod messages;
pub mod protocol;
pub mod relay;
pub mod ws;

use lobby::{ClientId, Lobby, Outgoing};
use messages::{ClientMessage, ClientRequest, ServerMessage};

/// Capacity of the communication channels between local tasks
pub const LOCAL_CHANNEL_CAPACITY: usize = 32;

/// Main thread message to server thread
#[derive(Debug)]
pub enum MainThreadMessage {
    ClientConnected(ClientId, mpsc::Sender<ServerMessage>),
}

/// Relay actor.
///
/// Owns the lobby and the channel to every client task, so each room is only ever
/// mutated by one event at a time.
#[derive(Debug)]
pub struct Server {
    // Channel to receive messages from the main thread
    main_rx: mpsc::Receiver<MainThreadMessage>,
    // Clients list
    clients_tx: HashMap<ClientId, mpsc::Sender<ServerMessage>>,
    // Channel for receiving messages from local client threads
    clients_rx: mpsc::Receiver<ClientMessage>,
    // Room pairing state
    lobby: Lobby,
}

impl Server {
    /// Creates a new server instance
    pub fn new(
        main_rx: mpsc::Receiver<MainThreadMessage>,
        clients_rx: mpsc::Receiver<ClientMessage>,
    ) -> Self {
        Self {
            main_rx,
            clients_tx: HashMap::new(),
            clients_rx,
            lobby: Lobby::new(),
        }
    }

    /// Queue messages without waiting on any client.
    ///
    /// A client whose channel is full is dropped and its room closed.
    fn deliver(&mut self, outgoing: Vec<Outgoing>) {
        let mut queue = VecDeque::from(outgoing);
        while let Some(Outgoing { to, message }) = queue.pop_front() {
            let Some(client_tx) = self.clients_tx.get(&to) else {
                log::warn!("[Server] Client {to} is gone, dropping {message:?}");
                continue;
            };
            match client_tx.try_send(ServerMessage::Remote(message)) {
                Ok(()) => {}
                Err(TrySendError::Full(message)) => {
                    log::warn!(
                        "[Server] Client {to} is not keeping up, dropping it at {message:?}"
                    );
                    // Dropping the sender ends the client task once it drains its queue
                    self.clients_tx.remove(&to);
                    queue.extend(self.lobby.disconnect(to));
                }
                Err(TrySendError::Closed(message)) => {
                    log::debug!("[Server] Client {to} already closed, dropping {message:?}");
                }
            }
        }
    }

    fn handle_main_message(&mut self, message: MainThreadMessage) {
        match message {
            MainThreadMessage::ClientConnected(client_id, client_tx) => {
                if let hash_map::Entry::Vacant(entry) = self.clients_tx.entry(client_id) {
                    entry.insert(client_tx);
                    log::info!(
                        "[Server] Client {client_id} connected ({n_connected} online)",
                        n_connected = self.clients_tx.len()
                    );
                } else {
                    log::error!("[Server] Client {client_id} is already connected");
                }
            }
        }
    }

    fn handle_client_message(&mut self, message: ClientMessage) {
        let ClientMessage { client_id, request } = message;
        log::debug!("[Server] Request from client {client_id}: {request:?}");

        // Requests still in flight from a client that was dropped
        if !self.clients_tx.contains_key(&client_id)
            && !matches!(request, ClientRequest::Disconnect)
        {
            log::debug!("[Server] Ignoring request from unknown client {client_id}");
            return;
        }

        let outgoing = match request {
            ClientRequest::JoinGame => self.lobby.join(client_id),
            ClientRequest::MakeMove {
                room_id,
                index,
                player,
            } => self.lobby.make_move(client_id, room_id, index, player),
            ClientRequest::Disconnect => {
                self.clients_tx.remove(&client_id);
                log::info!(
                    "[Server] Client {client_id} disconnected ({n_connected} online)",
                    n_connected = self.clients_tx.len()
                );
                self.lobby.disconnect(client_id)
            }
        };

        self.deliver(outgoing);
    }

    /// Ask every client task to close its connection
    fn disconnect_clients(&mut self) {
        for (client_id, client_tx) in self.clients_tx.drain() {
            // A full channel is closed by dropping the sender
            if let Err(e) = client_tx.try_send(ServerMessage::Disconnect) {
                log::debug!("[Server] Client {client_id} not told to disconnect: {e}");
            }
        }
    }

    /// Main server thread loop, runs until the main thread drops its sender
    pub async fn run(mut self) -> Result<()> {
        log::trace!("[Server] Task started");

        let result = loop {
            tokio::select! {
                // Registrations first, so a client is known before its first request
                biased;

                main_msg = self.main_rx.recv() => {
                    match main_msg {
                        Some(message) => self.handle_main_message(message),
                        None => {
                            log::info!("[Server] Main channel closed, shutting down");
                            break Ok(());
                        }
                    }
                }

                client_msg = self.clients_rx.recv() => {
                    match client_msg {
                        Some(message) => self.handle_client_message(message),
                        None => break Err(anyhow!("Channel from clients closed")),
                    }
                }
            }
        };

        log::info!("[Server] Disconnecting all clients");
        self.disconnect_clients();

        result
    }
}
