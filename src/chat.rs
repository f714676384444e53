//! Chat message model
//!
//! `Message` is what rooms store and what the server emits. Clients submit
//! a `MessageDraft`; the server stamps the sender and fills in any missing
//! id or date when turning it into a `Message`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::{Sender, SystemUser};
use crate::types::new_id;

/// Text of the info message every room is seeded with
pub const ROOM_CREATED_TEXT: &str = "Room created";

/// Image attachment metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub uri: String,
    pub image_name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// File attachment metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub uri: String,
    pub file_name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Message payload, tagged by the `type` field
///
/// Exactly one payload exists per type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text { text: String },
    Image { image: ImageAttachment },
    File { file: FileAttachment },
    Info { text: String },
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    #[serde(flatten)]
    pub body: MessageBody,
    pub date: DateTime<Utc>,
}

impl Message {
    /// Create a message authored by `sender` at the current time
    pub fn new(sender: Sender, body: MessageBody) -> Self {
        Self {
            id: new_id(),
            sender,
            body,
            date: Utc::now(),
        }
    }

    /// The "Room created" info message from the system author
    pub fn room_created() -> Self {
        Self::new(
            Sender::System(SystemUser::new()),
            MessageBody::Info {
                text: ROOM_CREATED_TEXT.to_string(),
            },
        )
    }

    /// Text of text and info messages
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { text } | MessageBody::Info { text } => Some(text),
            MessageBody::Image { .. } | MessageBody::File { .. } => None,
        }
    }
}

/// A message as submitted by a client
///
/// Any `sender` the client includes is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            body: MessageBody::Text { text: text.into() },
            date: None,
        }
    }

    /// Turn the draft into a message authored by `sender`
    pub fn into_message(self, sender: impl Into<Sender>) -> Message {
        Message {
            id: self.id.unwrap_or_else(new_id),
            sender: sender.into(),
            body: self.body,
            date: self.date.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{Participant, Role};
    use crate::types::{ConnectionId, IdCard};

    fn student() -> Participant {
        Participant::new(ConnectionId::new(), IdCard::from("S1"), "Ani".into(), Role::Siswa)
    }

    #[test]
    fn test_room_created_message() {
        let msg = Message::room_created();
        assert!(msg.sender.is_system());
        assert_eq!(msg.text(), Some(ROOM_CREATED_TEXT));
        assert!(matches!(msg.body, MessageBody::Info { .. }));
    }

    #[test]
    fn test_draft_keeps_client_id_and_date() {
        let json = r#"{"id": "m-1", "type": "text", "text": "hi", "date": "2024-03-01T08:00:00.000Z",
                       "sender": {"id": "forged"}}"#;
        let draft: MessageDraft = serde_json::from_str(json).unwrap();
        let msg = draft.into_message(student());

        assert_eq!(msg.id, "m-1");
        assert_eq!(msg.text(), Some("hi"));
        assert_eq!(msg.date.to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert_eq!(msg.sender.id_card(), Some(&IdCard::from("S1")));
    }

    #[test]
    fn test_draft_fills_missing_id_and_date() {
        let draft: MessageDraft = serde_json::from_str(r#"{"type": "text", "text": "hi"}"#).unwrap();
        let before = Utc::now();
        let msg = draft.into_message(student());

        assert!(!msg.id.is_empty());
        assert!(msg.date >= before);
    }

    #[test]
    fn test_image_draft() {
        let json = r#"{"type": "image", "image": {"uri": "file://a.png", "imageName": "a.png", "size": 12}}"#;
        let draft: MessageDraft = serde_json::from_str(json).unwrap();
        match draft.body {
            MessageBody::Image { image } => {
                assert_eq!(image.image_name, "a.png");
                assert!(image.width.is_none());
            }
            other => panic!("Wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_draft_missing_payload_is_rejected() {
        assert!(serde_json::from_str::<MessageDraft>(r#"{"type": "file"}"#).is_err());
        assert!(serde_json::from_str::<MessageDraft>(r#"{"text": "no type"}"#).is_err());
    }

    #[test]
    fn test_message_serialize_flattens_body() {
        let msg = MessageDraft::text("hi").into_message(student());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hi");
        assert_eq!(json["sender"]["idCard"], "S1");
        assert!(json["date"].is_string());
    }
}
