//! WebSocket implementation of the push transport.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use pawlink_shared::types::ConversationId;

use crate::error::TransportError;
use crate::transport::{PushConnector, PushStream};

/// Connects to the backend's per-conversation chat socket:
/// `{ws_base}/ws/chat/{conversation_id}/?token={credential}`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    ws_base: String,
}

impl WsConnector {
    /// `ws_base` e.g. `ws://127.0.0.1:8001` (no trailing slash needed).
    pub fn new(ws_base: impl Into<String>) -> Self {
        let mut ws_base = ws_base.into();
        while ws_base.ends_with('/') {
            ws_base.pop();
        }
        Self { ws_base }
    }

    fn socket_url(&self, conversation: ConversationId, credential: &str) -> String {
        format!(
            "{}/ws/chat/{}/?token={}",
            self.ws_base, conversation, credential
        )
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(
        &self,
        conversation: ConversationId,
        credential: &str,
    ) -> Result<Box<dyn PushStream>, TransportError> {
        let url = self.socket_url(conversation, credential);
        let (inner, _response) = connect_async(&url).await?;
        debug!(conversation = %conversation, "Push socket connected");
        Ok(Box::new(WsStream { inner }))
    }
}

struct WsStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushStream for WsStream {
    async fn next_frame(&mut self) -> Option<String> {
        while let Some(frame) = self.inner.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => return Some(text),
                Ok(WsMessage::Close(_)) => return None,
                // Ping/pong are answered by the library; binary frames are
                // not part of the chat protocol.
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "Push socket errored; treating as closed");
                    return None;
                }
            }
        }
        None
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.inner
            .send(WsMessage::Text(text))
            .await
            .map_err(TransportError::from)
    }

    async fn close(&mut self) {
        let _ = self.inner.close(None).await;
    }
}
