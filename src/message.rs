//! Event protocol definitions
//!
//! JSON-based bidirectional protocol of named events. Every frame is
//! `{"event": "<name>", "data": <payload>}`, using Serde's adjacently
//! tagged enums for type-safe serialization/deserialization.

use serde::{Deserialize, Serialize};

use crate::chat::{Message as ChatMessage, MessageDraft};
use crate::participant::{Participant, Role};
use crate::room::RoomSummary;
use crate::types::{ConnectionId, IdCard};

/// Payload of `register`
///
/// Accepts both `idCard`/`username` and the older `id_card`/`name` keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(alias = "id_card")]
    pub id_card: IdCard,
    #[serde(alias = "name")]
    pub username: String,
    pub role: Role,
}

/// Counterpart of a private message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    pub id_card: IdCard,
    /// Display name used if the opponent is offline when the room is created
    #[serde(default)]
    pub name: Option<String>,
}

/// Client → Server event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Bind this connection to an identity (required before anything else)
    Register(Registration),
    /// Request room list and online counterparts
    GetStats,
    /// Join a topic room by id
    Join(String),
    /// Leave a topic room by id
    Leave(String),
    /// Post to a topic room
    SendMessage { message: MessageDraft, room_id: String },
    /// Load history of the private room with an opponent id card
    LoadPrivateMessages(IdCard),
    /// Clear the unread counter of the private room with an opponent id card
    ResetCount(IdCard),
    /// Ask for the live connection id of an online participant
    GetSocketId { id_card: IdCard, role: Role },
    /// Send a private message
    SendPrivateMessage { message: MessageDraft, opponent: Opponent },
    /// Typing in the private room with an opponent id card
    PrivateTyping(IdCard),
    /// Typing in a topic room by id
    Typing(String),
}

impl ClientEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Register(_) => "register",
            ClientEvent::GetStats => "getStats",
            ClientEvent::Join(_) => "join",
            ClientEvent::Leave(_) => "leave",
            ClientEvent::SendMessage { .. } => "sendMessage",
            ClientEvent::LoadPrivateMessages(_) => "loadPrivateMessages",
            ClientEvent::ResetCount(_) => "resetCount",
            ClientEvent::GetSocketId { .. } => "getSocketId",
            ClientEvent::SendPrivateMessage { .. } => "sendPrivateMessage",
            ClientEvent::PrivateTyping(_) => "privateTyping",
            ClientEvent::Typing(_) => "typing",
        }
    }
}

/// Server → Client event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Connection accepted, connection id issued
    Connected { socket_id: ConnectionId },
    /// A teacher registered
    TeacherOnline { user: Participant, socket_id: ConnectionId },
    /// A student registered
    StudentOnline { user: Participant, socket_id: ConnectionId },
    /// A teacher disconnected
    TeacherOffline(Participant),
    /// A student disconnected
    StudentOffline(Participant),
    /// Reply to `getStats`
    StatsLoaded {
        rooms: Vec<RoomSummary>,
        online_users: Vec<Participant>,
    },
    /// Reply to `join`
    Joined {
        room_id: String,
        users: Vec<Participant>,
        messages: Vec<ChatMessage>,
    },
    /// New message in a joined topic room
    Message(ChatMessage),
    /// Fresh room list for the recipient
    RoomUpdated { rooms: Vec<RoomSummary> },
    /// Reply to `loadPrivateMessages`
    PrivateMessagesLoaded { messages: Vec<ChatMessage> },
    /// Incoming private message
    GotPrivateMessage { message: ChatMessage, user: Participant },
    /// Reply to `getSocketId`
    GotSocketId(ConnectionId),
    /// Someone is typing in a room the recipient is in
    Typing { room_id: String, who: Participant },
    /// Someone is typing somewhere (global fallback)
    BcTyping { room_id: String, who: Participant },
}

impl ServerEvent {
    /// Online notice for a freshly registered participant
    pub fn online(user: Participant) -> Self {
        let socket_id = user.id;
        if user.role.is_teacher() {
            ServerEvent::TeacherOnline { user, socket_id }
        } else {
            ServerEvent::StudentOnline { user, socket_id }
        }
    }

    /// Offline notice for a disconnected participant
    pub fn offline(user: Participant) -> Self {
        if user.role.is_teacher() {
            ServerEvent::TeacherOffline(user)
        } else {
            ServerEvent::StudentOffline(user)
        }
    }
}
