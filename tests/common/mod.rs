#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures::{SinkExt, StreamExt};
use tictactoe_server::server::protocol::{ClientCodec, Encoding, RemoteInMessage, RemoteOutMessage};
use tokio::{io::AsyncWriteExt, net::TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tokio_util::codec::Framed;
use uuid::Uuid;

/// Time allowed for any single message to arrive
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    process: Child,
    pub address: String,
    encoding: Encoding,
    ws_port: Option<u16>,
}

fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

impl TestServer {
    pub fn new() -> Result<Self> {
        Self::with_encoding(Encoding::Json)
    }

    pub fn with_encoding(encoding: Encoding) -> Result<Self> {
        Self::spawn(encoding, None)
    }

    /// JSON over TCP plus the WebSocket routes
    pub fn with_websocket() -> Result<Self> {
        Self::spawn(Encoding::Json, Some(free_port()?))
    }

    fn spawn(encoding: Encoding, ws_port: Option<u16>) -> Result<Self> {
        // Let the OS pick a free port
        let address = format!("127.0.0.1:{}", free_port()?);

        // Spawn server
        let path = env!("CARGO_BIN_EXE_tictactoe-server");
        let mut command = Command::new(path);
        command
            .arg("--socket")
            .arg(&address)
            .arg("--encoding")
            .arg(encoding.to_string());
        if let Some(ws_port) = ws_port {
            command.arg("--ws-port").arg(ws_port.to_string());
        }
        let mut process = command
            .env("RUST_LOG", "debug")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to spawn server")?;

        // Wait for server to be ready by polling every listener
        let listeners: Vec<String> = std::iter::once(address.clone())
            .chain(ws_port.map(|port| format!("127.0.0.1:{port}")))
            .collect();
        let mut started = false;
        for _ in 0..50 {
            if listeners
                .iter()
                .all(|listener| std::net::TcpStream::connect(listener).is_ok())
            {
                started = true;
                break;
            }

            // Check if process is still running
            match process.try_wait() {
                Ok(Some(status)) => {
                    return Err(anyhow!("Server process exited early with status: {status}"));
                }
                Ok(None) => {}
                Err(e) => return Err(anyhow!("Error checking server process status: {e}")),
            }

            thread::sleep(Duration::from_millis(100));
        }

        if !started {
            let _ = process.kill();
            return Err(anyhow!("Server failed to accept connections within timeout"));
        }

        Ok(Self {
            process,
            address,
            encoding,
            ws_port,
        })
    }

    /// Connect to a WebSocket route, `/ws` or `/ws/cbor`
    pub async fn ws_client(&self, route: &str) -> Result<WsClient> {
        let port = self.ws_port.context("Server started without WebSocket")?;
        let url = format!("ws://127.0.0.1:{port}{route}");
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {url}"))?;
        Ok(WsClient { socket })
    }

    pub async fn client(&self) -> Result<TestClient> {
        let stream = TcpStream::connect(&self.address)
            .await
            .context("Failed to connect to server")?;
        Ok(TestClient {
            framed: Framed::new(stream, ClientCodec::new(self.encoding)),
        })
    }

    /// Two clients already paired in a room, returns the room id
    pub async fn paired(&self) -> Result<(TestClient, TestClient, Uuid)> {
        let mut host = self.client().await?;
        let room_id = host.join().await?;
        let mut guest = self.client().await?;
        guest.send(RemoteInMessage::JoinGame).await?;
        match guest.recv().await? {
            RemoteOutMessage::GameJoined { room_id: joined, .. } if joined == room_id => {}
            other => return Err(anyhow!("Expected game_joined, got {other:?}")),
        }
        for client in [&mut host, &mut guest] {
            match client.recv().await? {
                RemoteOutMessage::GameStart { .. } => {}
                other => return Err(anyhow!("Expected game_start, got {other:?}")),
            }
        }
        Ok((host, guest, room_id))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

pub struct TestClient {
    framed: Framed<TcpStream, ClientCodec>,
}

impl TestClient {
    pub async fn send(&mut self, msg: RemoteInMessage) -> Result<()> {
        self.framed
            .send(msg)
            .await
            .context("Failed to send message")
    }

    /// Write a length prefixed frame holding arbitrary bytes
    pub async fn send_raw(&mut self, payload: &[u8]) -> Result<()> {
        let length = u32::try_from(payload.len())?;
        let stream = self.framed.get_mut();
        stream.write_all(&length.to_be_bytes()).await?;
        stream.write_all(payload).await?;
        stream.flush().await.context("Failed to send raw frame")
    }

    pub async fn recv(&mut self) -> Result<RemoteOutMessage> {
        match tokio::time::timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .context("Timed out waiting for a message")?
        {
            Some(Ok(msg)) => Ok(msg),
            Some(Err(e)) => Err(e),
            None => Err(anyhow!("Connection closed")),
        }
    }

    /// Nothing arrives within `duration`
    pub async fn expect_silence(&mut self, duration: Duration) -> Result<()> {
        match tokio::time::timeout(duration, self.framed.next()).await {
            Err(_) => Ok(()),
            Ok(message) => Err(anyhow!("Unexpected message: {message:?}")),
        }
    }

    /// Send `join_game` and wait for the room to be created
    pub async fn join(&mut self) -> Result<Uuid> {
        self.send(RemoteInMessage::JoinGame).await?;
        match self.recv().await? {
            RemoteOutMessage::GameCreated { room_id, .. } => Ok(room_id),
            other => Err(anyhow!("Expected game_created, got {other:?}")),
        }
    }
}

pub struct WsClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send as a JSON text frame
    pub async fn send(&mut self, msg: RemoteInMessage) -> Result<()> {
        let text = serde_json::to_string(&msg)?;
        self.socket
            .send(Message::text(text))
            .await
            .context("Failed to send text frame")
    }

    /// Send as a CBOR binary frame
    pub async fn send_binary(&mut self, msg: RemoteInMessage) -> Result<()> {
        let payload = Encoding::Cbor.encode(&msg)?;
        self.socket
            .send(Message::binary(payload))
            .await
            .context("Failed to send binary frame")
    }

    /// Next message along with the frame kind it came in
    pub async fn recv(&mut self) -> Result<(RemoteOutMessage, Encoding)> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.socket.next())
                .await
                .context("Timed out waiting for a message")?
                .ok_or_else(|| anyhow!("Connection closed"))??;
            match frame {
                Message::Text(text) => {
                    return Ok((Encoding::Json.decode(text.as_str().as_bytes())?, Encoding::Json));
                }
                Message::Binary(payload) => {
                    return Ok((Encoding::Cbor.decode(&payload)?, Encoding::Cbor));
                }
                Message::Close(_) => return Err(anyhow!("Connection closed")),
                // Control frames
                _ => {}
            }
        }
    }
}
