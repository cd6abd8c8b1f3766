//! # pawlink-shared
//!
//! Domain types shared across the Pawlink client crates: conversation and
//! message models, push-event payloads, and the constants that pin down the
//! backend's paging and timing contracts.

pub mod constants;
pub mod models;
pub mod protocol;
pub mod types;

pub use models::{
    Announcement, AnnouncementStatus, ChatUser, Conversation, LastMessage, Message, MessageBatch,
    Page, Pet,
};
pub use protocol::{decode_frame, OutboundChat, PushEvent};
pub use types::{AnnouncementId, ConversationId, MessageId, UserId};
