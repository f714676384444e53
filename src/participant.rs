//! Participant identities
//!
//! A `Participant` is a registered user bound to one connection. Messages
//! carry a `Sender`, which is either a participant snapshot or the
//! synthetic system author used for room seed messages.

use serde::{Deserialize, Serialize};

use crate::types::{new_id, ConnectionId, IdCard};

/// Participant role as sent by the client app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Subject teacher
    Guru,
    /// Guidance counsellor ("Bimbingan Konseling"), treated as a teacher
    Bk,
    /// Student
    Siswa,
}

impl Role {
    /// Teacher-class roles share the teacher roster
    pub fn is_teacher(self) -> bool {
        matches!(self, Role::Guru | Role::Bk)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Guru => "GURU",
            Role::Bk => "BK",
            Role::Siswa => "SISWA",
        };
        f.write_str(label)
    }
}

/// A registered participant
///
/// `id` is the connection the participant registered on and changes on
/// every reconnect; `id_card` is the only stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ConnectionId,
    pub id_card: IdCard,
    pub name: String,
    pub role: Role,
}

impl Participant {
    pub fn new(id: ConnectionId, id_card: IdCard, name: String, role: Role) -> Self {
        Self {
            id,
            id_card,
            name,
            role,
        }
    }
}

/// Author of the synthetic messages the server itself creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUser {
    pub id: String,
    pub id_card: String,
    pub name: &'static str,
    pub role: &'static str,
}

impl SystemUser {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            id_card: new_id(),
            name: "System",
            role: "system",
        }
    }
}

impl Default for SystemUser {
    fn default() -> Self {
        Self::new()
    }
}

/// Message author
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Sender {
    Participant(Participant),
    System(SystemUser),
}

impl Sender {
    pub fn is_system(&self) -> bool {
        matches!(self, Sender::System(_))
    }

    /// Stable identity of a participant author, `None` for the system
    pub fn id_card(&self) -> Option<&IdCard> {
        match self {
            Sender::Participant(p) => Some(&p.id_card),
            Sender::System(_) => None,
        }
    }
}

impl From<Participant> for Sender {
    fn from(participant: Participant) -> Self {
        Sender::Participant(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_classes() {
        assert!(Role::Guru.is_teacher());
        assert!(Role::Bk.is_teacher());
        assert!(!Role::Siswa.is_teacher());
    }

    #[test]
    fn test_role_wire_names() {
        let role: Role = serde_json::from_str("\"SISWA\"").unwrap();
        assert_eq!(role, Role::Siswa);
        assert_eq!(serde_json::to_string(&Role::Bk).unwrap(), "\"BK\"");
        assert!(serde_json::from_str::<Role>("\"ADMIN\"").is_err());
    }

    #[test]
    fn test_participant_camel_case() {
        let p = Participant::new(ConnectionId::new(), IdCard::from("S1"), "Ani".into(), Role::Siswa);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["idCard"], "S1");
        assert_eq!(json["role"], "SISWA");
    }

    #[test]
    fn test_system_sender_shape() {
        let sender = Sender::System(SystemUser::new());
        assert!(sender.is_system());
        assert!(sender.id_card().is_none());

        let json = serde_json::to_value(&sender).unwrap();
        assert_eq!(json["name"], "System");
        assert_eq!(json["role"], "system");
        assert!(json["idCard"].is_string());
    }
}
