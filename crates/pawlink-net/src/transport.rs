//! Push-transport seam.
//!
//! The sync engine owns at most one live stream at a time and drives it from
//! a single task, so the stream trait takes `&mut self` throughout. Tests
//! inject fake connectors; production uses [`crate::ws::WsConnector`].

use async_trait::async_trait;

use pawlink_shared::types::ConversationId;

use crate::error::TransportError;

/// Opens a push stream scoped to one conversation.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(
        &self,
        conversation: ConversationId,
        credential: &str,
    ) -> Result<Box<dyn PushStream>, TransportError>;
}

/// A live push connection delivering raw text frames.
#[async_trait]
pub trait PushStream: Send + Sync {
    /// Next text frame from the server; `None` once the connection has
    /// closed (for any reason, including errors).
    async fn next_frame(&mut self) -> Option<String>;

    /// Send a raw text frame. Fire-and-forget from the caller's point of
    /// view: delivery confirmation arrives as an echo frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection. Must be safe to call on an already-dead stream.
    async fn close(&mut self);
}
