//! HTTP and WebSocket connection handling
//!
//! Serves the liveness route and the WebSocket upgrade with axum. Each
//! upgraded socket gets a read task (events in) and a write task (events
//! out), and talks to the server actor only through `ServerCommand`s.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::OUTBOUND_BUFFER_SIZE;
use crate::error::AppError;
use crate::health::health_check;
use crate::message::{ClientEvent, ServerEvent};
use crate::server::ServerCommand;
use crate::types::ConnectionId;

/// Path clients open their WebSocket on
pub const WS_PATH: &str = "/ws";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Command channel into the server actor
    pub cmd_tx: mpsc::Sender<ServerCommand>,
}

/// Build the router: `GET /` liveness and the WebSocket route
pub fn router(cmd_tx: mpsc::Sender<ServerCommand>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route(WS_PATH, get(websocket_handler))
        .with_state(AppState { cmd_tx })
}

/// Serve the router on `listener` until the listener fails
pub async fn serve(listener: TcpListener, cmd_tx: mpsc::Sender<ServerCommand>) -> Result<(), AppError> {
    let app = router(cmd_tx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Upgrade the request and hand the socket to `handle_socket`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_socket(socket, peer_addr, state.cmd_tx).await {
            error!("Connection handler error: {}", e);
        }
    })
}

/// Manage one upgraded connection from open to disconnect
pub async fn handle_socket(
    socket: WebSocket,
    peer_addr: SocketAddr,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = ConnectionId::new();
    info!("Connection {} opened from {}", connection_id, peer_addr);

    // Channel for server -> client events
    let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER_SIZE);

    if cmd_tx
        .send(ServerCommand::Connect {
            connection_id,
            sender: event_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register connection {}, server closed", connection_id);
        return Err(AppError::ChannelSend);
    }

    let cmd_tx_read = cmd_tx.clone();

    // Read task (WebSocket -> ServerCommand), yields the disconnect reason
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => {
                        let cmd = ServerCommand::Event {
                            connection_id,
                            event,
                        };
                        if cmd_tx_read.send(cmd).await.is_err() {
                            return "server shutting down";
                        }
                    }
                    Err(e) => {
                        // No error reply in this protocol
                        warn!("Invalid event from {}: {}", connection_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", connection_id);
                    return "client namespace disconnect";
                }
                Ok(_) => {
                    // Binary, ping and pong frames; pong is handled by axum
                }
                Err(e) => {
                    warn!("WebSocket error for {}: {}", connection_id, e);
                    return "transport error";
                }
            }
        }
        "transport close"
    });

    // Write task (ServerEvent -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }

        let _ = ws_sender.close().await;
    });

    let reason = tokio::select! {
        reason = &mut read_task => reason.unwrap_or("read task failed"),
        _ = &mut write_task => {
            read_task.abort();
            "transport error"
        }
    };

    // The write task ends once the server drops this connection's sender
    let _ = cmd_tx
        .send(ServerCommand::Disconnect {
            connection_id,
            reason: reason.to_string(),
        })
        .await;

    info!("Connection {} closed: {}", connection_id, reason);

    Ok(())
}
