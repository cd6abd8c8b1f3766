//! REST payload models for the chat and announcement endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnnouncementId, ConversationId, MessageId, UserId};

/// Public profile of a chat participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Summary of the newest message, embedded in a conversation listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastMessage {
    pub id: MessageId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub sender_id: UserId,
}

/// A chat thread tied to one announcement and one counterpart user.
///
/// The backend guarantees exactly one conversation per (announcement,
/// participant pair); the client never creates or deletes these locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub announcement_id: AnnouncementId,
    pub announcement_title: String,
    #[serde(default)]
    pub announcement_status: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Time of the newest message, annotated server-side. `None` for a
    /// conversation that has no messages yet.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub other_user: Option<ChatUser>,
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// The ordering key for the conversation list: last message time, else
    /// the server-annotated update time, else creation time.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map(|m| m.created_at)
            .or(self.updated_at)
            .unwrap_or(self.created_at)
    }
}

/// A single chat message. Immutable once created; `id` is the dedup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "conversation", alias = "conversation_id")]
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Paginated envelope returned by the conversation listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

/// Envelope returned by the message history endpoint. Messages come back in
/// ascending order; `next_before_id` is the cursor for older history, absent
/// once the full history has been paged through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageBatch {
    pub results: Vec<Message>,
    #[serde(default)]
    pub next_before_id: Option<MessageId>,
}

/// Whether an announcement reports a lost or a found pet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Lost,
    Found,
}

/// Pet details attached to an announcement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    pub name: String,
    pub pet_type: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
}

/// Geocoded position attached to an announcement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementLocation {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A lost/found announcement as listed by the browse endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub status: AnnouncementStatus,
    pub pet: Pet,
    #[serde(default)]
    pub location: Option<AnnouncementLocation>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
