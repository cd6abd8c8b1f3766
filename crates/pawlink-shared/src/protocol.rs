//! Push-transport payloads.
//!
//! The server tags every frame with a `type` discriminant. Only `message`
//! frames matter to the client; everything else must be ignorable without
//! error, which the catch-all variant guarantees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Message;
use crate::types::{ConversationId, MessageId, UserId};

/// An inbound frame from the push transport.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PushEvent {
    /// A new chat message, broadcast to every participant of the
    /// conversation (including the sender, as the echo).
    #[serde(rename = "message")]
    Message(PushMessage),

    /// Any frame with an unrecognized discriminant.
    #[serde(other)]
    Other,
}

/// Body of a `message` push frame.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PushMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<PushMessage> for Message {
    fn from(p: PushMessage) -> Self {
        Self {
            id: p.id,
            conversation_id: p.conversation_id,
            sender_id: p.sender_id,
            text: p.text,
            created_at: p.created_at,
        }
    }
}

/// Decode a raw text frame. Callers decide how loudly to log failures;
/// a malformed frame is never fatal.
pub fn decode_frame(raw: &str) -> Result<PushEvent, serde_json::Error> {
    serde_json::from_str(raw)
}

/// An outbound frame sent over the push transport.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundChat<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

impl<'a> OutboundChat<'a> {
    pub fn message(text: &'a str) -> Self {
        Self {
            kind: "message",
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_message_frame() {
        let raw = r#"{"type":"message","id":9,"conversation_id":3,"sender_id":7,"text":"found him!","created_at":"2024-05-01T10:00:00Z"}"#;
        match decode_frame(raw).unwrap() {
            PushEvent::Message(m) => {
                assert_eq!(m.id, MessageId(9));
                assert_eq!(m.conversation_id, ConversationId(3));
                assert_eq!(m.text, "found him!");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminant_is_ignorable() {
        let raw = r#"{"type":"typing","conversation_id":3}"#;
        assert_eq!(decode_frame(raw).unwrap(), PushEvent::Other);
    }

    #[test]
    fn malformed_frames_error_without_panic() {
        assert!(decode_frame("not json").is_err());
        // Right discriminant, wrong shape.
        assert!(decode_frame(r#"{"type":"message","id":"nope"}"#).is_err());
    }

    #[test]
    fn outbound_frame_carries_type_tag() {
        let json = serde_json::to_string(&OutboundChat::message("on my way")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["text"], "on my way");
    }
}
