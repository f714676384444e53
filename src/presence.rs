//! Presence index
//!
//! Maps a participant's stable identity to the connection it is currently
//! reachable on. Direct deliveries (private messages, private typing,
//! socket id lookups) resolve their target here at send time.

use std::collections::HashMap;

use crate::types::{ConnectionId, IdCard};

#[derive(Debug, Default)]
pub struct PresenceIndex {
    connections: HashMap<IdCard, ConnectionId>,
}

impl PresenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `id_card` at `connection_id`, returning the connection it
    /// pointed at before
    pub fn insert(&mut self, id_card: IdCard, connection_id: ConnectionId) -> Option<ConnectionId> {
        self.connections.insert(id_card, connection_id)
    }

    /// Remove the entry for `id_card` if it still points at `connection_id`
    ///
    /// A participant that already reconnected elsewhere keeps its newer entry.
    pub fn remove(&mut self, id_card: &IdCard, connection_id: ConnectionId) -> bool {
        if self.connections.get(id_card) == Some(&connection_id) {
            self.connections.remove(id_card);
            true
        } else {
            false
        }
    }

    /// Live connection for `id_card`
    pub fn get(&self, id_card: &IdCard) -> Option<ConnectionId> {
        self.connections.get(id_card).copied()
    }

    pub fn contains(&self, id_card: &IdCard) -> bool {
        self.connections.contains_key(id_card)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
