//! Classroom Chat Server Library
//!
//! Real-time presence and messaging for a fixed set of topic rooms plus
//! private conversations between teachers and students, kept in memory
//! for the lifetime of the process.
//!
//! # Features
//! - Registration binding a connection to a stable identity (id card)
//! - Online rosters for teachers and students with presence broadcasts
//! - Topic rooms with message history and typing indicators
//! - Lazily created private rooms with unread counters
//! - Cleanup of rooms, rosters and presence on disconnect
//! - Liveness response on `GET /`
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Server` is the central actor owning the `ChatServer` registry, the
//!   `PresenceIndex` and every connection's `Session`
//! - Each WebSocket (served by axum) has read and write tasks talking to the server
//! - All state access goes through message passing, so no locks are needed
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use classroom_chat::{serve, topic_rooms, ChatServer, Server, DEFAULT_TOPICS};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8888").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     let chat = ChatServer::new(topic_rooms(DEFAULT_TOPICS.iter().copied()));
//!     tokio::spawn(Server::new(chat, cmd_rx).run());
//!
//!     serve(listener, cmd_tx).await.unwrap();
//! }
//! ```

pub mod chat;
pub mod chat_server;
pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod message;
pub mod participant;
pub mod presence;
pub mod private_chat;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use chat::{Message, MessageBody, MessageDraft};
pub use chat_server::{topic_rooms, ChatServer, DEFAULT_TOPICS};
pub use config::Config;
pub use error::{AppError, EventError, SendError};
pub use handler::{handle_socket, router, serve, WS_PATH};
pub use message::{ClientEvent, ServerEvent};
pub use participant::{Participant, Role, Sender};
pub use presence::PresenceIndex;
pub use private_chat::PrivateChat;
pub use room::{Room, RoomKind, RoomSummary};
pub use server::{Server, ServerCommand};
pub use session::{Session, SessionState};
pub use types::{new_id, ConnectionId, IdCard};
