//! Private conversations of one participant
//!
//! Each room in a `PrivateChat` is keyed by the counterpart's id card.

use crate::participant::Participant;
use crate::room::{Room, RoomKind};
use crate::types::IdCard;

/// All private rooms owned by one participant
#[derive(Debug, Clone)]
pub struct PrivateChat {
    /// Owner's stable identity
    pub user_id: IdCard,
    rooms: Vec<Room>,
}

impl PrivateChat {
    pub fn new(user_id: IdCard) -> Self {
        Self {
            user_id,
            rooms: Vec::new(),
        }
    }

    /// Append a new room for `counterpart` and return it
    ///
    /// Callers must check `get_room` first; this never looks for an
    /// existing room with the same key.
    pub fn create_room(
        &mut self,
        counterpart: &IdCard,
        name: String,
        members: Vec<Participant>,
    ) -> &mut Room {
        let room = Room::new(counterpart.0.clone(), name, members, RoomKind::Messages);
        self.rooms.push(room);
        let last = self.rooms.len() - 1;
        &mut self.rooms[last]
    }

    /// Return the room with `counterpart`, creating it if there is none yet
    pub fn get_or_create_room(
        &mut self,
        counterpart: &IdCard,
        name: String,
        members: Vec<Participant>,
    ) -> &mut Room {
        match self.rooms.iter().position(|r| r.id == counterpart.0) {
            Some(index) => &mut self.rooms[index],
            None => self.create_room(counterpart, name, members),
        }
    }

    /// Find the room with `counterpart`
    pub fn get_room(&self, counterpart: &IdCard) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == counterpart.0)
    }

    pub fn get_room_mut(&mut self, counterpart: &IdCard) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == counterpart.0)
    }

    /// Rooms in creation order
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }
}
