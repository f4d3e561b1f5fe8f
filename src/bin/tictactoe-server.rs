use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, sync::mpsc};

use tictactoe_server::server::{
    LOCAL_CHANNEL_CAPACITY, MainThreadMessage, Server,
    connection::{AppState, handle_connection, tcp_transport},
    messages::ClientMessage,
    protocol::Encoding,
    ws,
};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "tictactoe-server", version, about)]
struct Args {
    /// Host IP address
    #[arg(short, long, value_name = "ADDRESS", default_value = "127.0.0.1:8080")]
    socket: String,
    /// WebSocket port, disabled when absent
    #[arg(long, value_name = "PORT")]
    ws_port: Option<u16>,
    /// Payload encoding on TCP connections
    #[arg(short, long, value_enum, default_value_t = Encoding::Json)]
    encoding: Encoding,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();
    log::debug!("Command line arguments: {args:?}");

    // Client threads -> Server thread
    let (client_msg_tx, client_msg_rx) = mpsc::channel::<ClientMessage>(LOCAL_CHANNEL_CAPACITY);

    // Main thread -> Server thread
    let (main_tx, main_rx) = mpsc::channel::<MainThreadMessage>(LOCAL_CHANNEL_CAPACITY);

    // Spawn the server task
    let server = Server::new(main_rx, client_msg_rx);
    let mut server_handle = tokio::spawn(server.run());

    let app_state = AppState::new(main_tx, client_msg_tx);

    // Bind TCP listener to the socket address
    let listener = TcpListener::bind(&args.socket)
        .await
        .with_context(|| format!("Failed to bind listener to {}", args.socket))?;
    log::info!(
        "Listening (TCP, {encoding}) at {socket:?}",
        encoding = args.encoding,
        socket = args.socket
    );

    // WebSocket server
    if let Some(ws_port) = args.ws_port {
        let ws_addr = format!("0.0.0.0:{ws_port}");
        let ws_listener = TcpListener::bind(&ws_addr)
            .await
            .with_context(|| format!("Failed to bind WebSocket listener to {ws_addr}"))?;
        log::info!("Listening (WS) at {ws_addr}");

        let app = ws::router(app_state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(ws_listener, app).await {
                log::error!("Axum server error: {e}");
            }
        });
    }

    tokio::select! {
        // TCP connections loop
        _ = async {
            loop {
                match listener.accept().await {
                    Err(e) => {
                        log::error!("Failed to accept connection: {e:?}");
                        continue;
                    }
                    Ok((stream, addr)) => {
                        log::debug!("Accepted TCP connection from {addr}");
                        let (stream, sink) = tcp_transport(stream, args.encoding);
                        tokio::spawn(handle_connection(stream, sink, app_state.clone()));
                    }
                }
            }
        } => {},

        // Server task ended
        result = &mut server_handle => {
            result
                .with_context(|| "Server task panicked")?
                .with_context(|| "Server encountered an error")?;
        }

        // Ctrl-C
        _ = tokio::signal::ctrl_c() => {
            log::info!("Shutdown signal received");
        }
    }

    Ok(())
}
