//! Error types for the chat server
//!
//! Defines fatal connection errors, outbound send errors, and the reasons
//! an inbound event is ignored. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::IdCard;

/// Application-level errors
///
/// Fatal for the connection they occur on.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (internal channel broken)
    #[error("Channel send error")]
    ChannelSend,
}

/// Message send errors
///
/// Occurs when an outbound event cannot be queued for a connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The connection is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}

/// Why an inbound event had no effect
///
/// Never reported to the client; the protocol has no error reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// Event from a connection the server does not know (already closed)
    #[error("Unknown connection")]
    UnknownConnection,

    /// Event received before `register`
    #[error("Not registered")]
    Unauthenticated,

    /// `register` on a connection that is already registered
    #[error("Already registered")]
    AlreadyRegistered,

    /// No topic room with the given id
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// No private room with the given counterpart
    #[error("Private room not found: {0}")]
    PrivateRoomNotFound(IdCard),

    /// Counterpart has no live connection
    #[error("Participant offline: {0}")]
    ParticipantOffline(IdCard),

    /// Private message addressed to oneself
    #[error("Cannot message yourself")]
    SelfMessage,
}
