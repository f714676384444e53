//! Process-wide chat registry
//!
//! `ChatServer` holds the topic rooms, the online rosters for teachers and
//! students, and every participant's `PrivateChat`. It is plain data; the
//! `Server` actor is its only owner, which serializes every mutation.

use std::collections::HashMap;

use crate::participant::{Participant, Role};
use crate::private_chat::PrivateChat;
use crate::room::{Room, RoomSummary};
use crate::types::{ConnectionId, IdCard};

/// Topic rooms provisioned when no list is configured
pub const DEFAULT_TOPICS: &[&str] = &[
    "IPA",
    "IPS",
    "Matematika",
    "Fisika",
    "Bahasa Inggris",
    "Bahasa Indonesia",
    "Pendidikan Agama",
    "Penjasorkes",
    "Kesenian",
    "Biologi",
    "Kimia",
];

/// Build one topic room per name, in order
pub fn topic_rooms<I, S>(names: I) -> Vec<Room>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Room::topic).collect()
}

/// Online participants of one role class
///
/// Holds at most one entry per id card as long as entries only enter
/// through `upsert`.
#[derive(Debug, Default, Clone)]
struct Roster {
    entries: Vec<Participant>,
}

impl Roster {
    fn find(&self, id_card: &IdCard) -> Option<&Participant> {
        self.entries.iter().find(|p| &p.id_card == id_card)
    }

    fn upsert(&mut self, participant: Participant) {
        self.entries.retain(|p| p.id_card != participant.id_card);
        self.entries.push(participant);
    }

    fn remove_connection(&mut self, connection_id: ConnectionId) -> bool {
        match self.entries.iter().position(|p| p.id == connection_id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Root of the in-memory chat state
#[derive(Debug, Default)]
pub struct ChatServer {
    rooms: Vec<Room>,
    online_teachers: Roster,
    online_students: Roster,
    private_chats: HashMap<IdCard, PrivateChat>,
}

impl ChatServer {
    /// Create a registry over a fixed set of topic rooms
    pub fn new(rooms: Vec<Room>) -> Self {
        Self {
            rooms,
            ..Self::default()
        }
    }

    // ---- topic rooms ----

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn get_room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn get_room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == room_id)
    }

    pub fn room_exists(&self, room_id: &str) -> bool {
        self.get_room(room_id).is_some()
    }

    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    /// Remove every topic room membership held by `connection_id`
    pub fn leave_all_rooms(&mut self, connection_id: ConnectionId) {
        for room in &mut self.rooms {
            while room.leave(connection_id) {}
        }
    }

    // ---- rosters ----

    pub fn get_student(&self, id_card: &IdCard) -> Option<&Participant> {
        self.online_students.find(id_card)
    }

    pub fn get_teacher(&self, id_card: &IdCard) -> Option<&Participant> {
        self.online_teachers.find(id_card)
    }

    /// Add a student, replacing any entry with the same id card
    pub fn add_student(&mut self, participant: Participant) {
        self.online_students.upsert(participant);
    }

    /// Add a teacher, replacing any entry with the same id card
    pub fn add_teacher(&mut self, participant: Participant) {
        self.online_teachers.upsert(participant);
    }

    /// Remove the student entry registered on this participant's connection
    ///
    /// Entries for the same id card from other connections stay.
    pub fn remove_student(&mut self, participant: &Participant) -> bool {
        self.online_students.remove_connection(participant.id)
    }

    /// Remove the teacher entry registered on this participant's connection
    pub fn remove_teacher(&mut self, participant: &Participant) -> bool {
        self.online_teachers.remove_connection(participant.id)
    }

    pub fn online_students(&self) -> &[Participant] {
        &self.online_students.entries
    }

    pub fn online_teachers(&self) -> &[Participant] {
        &self.online_teachers.entries
    }

    /// Roster entry for `id_card` in the roster `role` belongs to
    pub fn get_online(&self, id_card: &IdCard, role: Role) -> Option<&Participant> {
        if role.is_teacher() {
            self.get_teacher(id_card)
        } else {
            self.get_student(id_card)
        }
    }

    /// Roster entry for `id_card` in either roster
    pub fn find_online(&self, id_card: &IdCard) -> Option<&Participant> {
        self.get_teacher(id_card).or_else(|| self.get_student(id_card))
    }

    /// Add to the roster matching the participant's role
    pub fn add_participant(&mut self, participant: Participant) {
        if participant.role.is_teacher() {
            self.add_teacher(participant);
        } else {
            self.add_student(participant);
        }
    }

    /// Remove from the roster matching the participant's role
    pub fn remove_participant(&mut self, participant: &Participant) -> bool {
        if participant.role.is_teacher() {
            self.remove_teacher(participant)
        } else {
            self.remove_student(participant)
        }
    }

    /// The roster a participant of `role` gets to see
    ///
    /// Teachers see students, students see teachers.
    pub fn visible_roster(&self, role: Role) -> &[Participant] {
        if role.is_teacher() {
            self.online_students()
        } else {
            self.online_teachers()
        }
    }

    // ---- private chats ----

    pub fn get_private_chat_by_user_id(&self, id_card: &IdCard) -> Option<&PrivateChat> {
        self.private_chats.get(id_card)
    }

    /// Lookup-or-create the private chat owned by `id_card`
    pub fn add_private_chat_by_user_id(&mut self, id_card: IdCard) -> &mut PrivateChat {
        self.private_chats
            .entry(id_card.clone())
            .or_insert_with(|| PrivateChat::new(id_card))
    }

    /// Get the private room `owner` keeps with `counterpart`, creating
    /// the chat and the room as needed
    ///
    /// A new room is named after the counterpart's roster entry and lists
    /// it as the member. An offline counterpart gets `fallback_name`, or
    /// its id card, as name.
    pub fn private_room_or_create(
        &mut self,
        owner: &IdCard,
        counterpart: &IdCard,
        fallback_name: Option<&str>,
    ) -> &mut Room {
        let online = self.find_online(counterpart).cloned();
        let (name, members) = match online {
            Some(p) => (p.name.clone(), vec![p]),
            None => (
                fallback_name
                    .map(str::to_string)
                    .unwrap_or_else(|| counterpart.to_string()),
                Vec::new(),
            ),
        };
        self.add_private_chat_by_user_id(owner.clone())
            .get_or_create_room(counterpart, name, members)
    }

    /// Existing private room `owner` keeps with `counterpart`
    pub fn get_private_room_mut(&mut self, owner: &IdCard, counterpart: &IdCard) -> Option<&mut Room> {
        self.private_chats.get_mut(owner)?.get_room_mut(counterpart)
    }

    /// Topic rooms followed by the private rooms owned by `id_card`
    pub fn room_list_for(&self, id_card: &IdCard) -> Vec<RoomSummary> {
        let private = self
            .get_private_chat_by_user_id(id_card)
            .map(PrivateChat::rooms)
            .unwrap_or_default();
        self.rooms.iter().chain(private).map(Room::summary).collect()
    }
}
