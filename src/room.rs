//! Room struct definition
//!
//! A room is either a topic group shared by everyone or one side of a
//! private conversation. It keeps an append-only message log, the current
//! members, and a pointer to the most recent message.

use serde::Serialize;

use crate::chat::Message;
use crate::participant::Participant;
use crate::types::{new_id, ConnectionId};

/// Kind of room, serialized as the room `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoomKind {
    /// Topic room visible to everyone
    Group,
    /// Private one-to-one conversation
    Messages,
}

/// Chat room
///
/// `last_message` starts as the system "Room created" message and then
/// always tracks the newest entry of the log.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room id: random for topic rooms, the counterpart's id card for private rooms
    pub id: String,
    /// Display name
    pub name: String,
    pub kind: RoomKind,
    users: Vec<Participant>,
    messages: Vec<Message>,
    last_message: Message,
    unread_count: u32,
}

impl Room {
    /// Create a room seeded with the "Room created" message
    pub fn new(id: String, name: String, users: Vec<Participant>, kind: RoomKind) -> Self {
        let seed = Message::room_created();
        Self {
            id,
            name,
            kind,
            users,
            messages: vec![seed.clone()],
            last_message: seed,
            unread_count: 0,
        }
    }

    /// Create a topic room with a fresh id and no members
    pub fn topic(name: impl Into<String>) -> Self {
        Self::new(new_id(), name.into(), Vec::new(), RoomKind::Group)
    }

    /// Add a member
    ///
    /// Does not deduplicate; check `has_member` first when a participant
    /// must appear once.
    pub fn join(&mut self, participant: Participant) {
        self.users.push(participant);
    }

    /// Remove the first member registered on `connection_id`
    ///
    /// Returns false if no member matched.
    pub fn leave(&mut self, connection_id: ConnectionId) -> bool {
        match self.users.iter().position(|u| u.id == connection_id) {
            Some(index) => {
                self.users.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append a message and make it the last message
    pub fn send(&mut self, message: Message) {
        self.last_message = message.clone();
        self.messages.push(message);
    }

    pub fn increment_unread(&mut self) {
        self.unread_count = self.unread_count.saturating_add(1);
    }

    pub fn reset_unread(&mut self) {
        self.unread_count = 0;
    }

    /// Check if a connection is among the members
    pub fn has_member(&self, connection_id: ConnectionId) -> bool {
        self.users.iter().any(|u| u.id == connection_id)
    }

    pub fn members(&self) -> &[Participant] {
        &self.users
    }

    /// Message log in display order, seed message first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> &Message {
        &self.last_message
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    /// Room listing entry without the message log
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            users: self.users.clone(),
            last_message: self.last_message.clone(),
            unread_count: self.unread_count,
        }
    }
}

/// Room as it appears in `statsLoaded` and `roomUpdated` lists
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    pub users: Vec<Participant>,
    pub last_message: Message,
    pub unread_count: u32,
}
