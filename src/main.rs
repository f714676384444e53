//! Classroom chat server - Entry Point
//!
//! Starts the TCP listener and the server actor, accepting connections.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use classroom_chat::config::CHANNEL_BUFFER_SIZE;
use classroom_chat::{serve, topic_rooms, ChatServer, Config, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=classroom_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("classroom_chat=info")),
        )
        .init();

    // First command line argument overrides the bind address
    let config = Config::from_env().with_addr(env::args().nth(1));

    let listener = TcpListener::bind(&config.addr).await?;
    info!("Listening on {}", config.addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let chat = ChatServer::new(topic_rooms(config.topics));
    tokio::spawn(Server::new(chat, cmd_rx).run());

    serve(listener, cmd_tx).await?;

    Ok(())
}
