//! Request/response API client for the Pawlink backend.
//!
//! The [`ChatApi`] trait is the seam the sync engine depends on; tests
//! substitute an in-memory implementation, production code uses
//! [`RestClient`] over HTTPS with a bearer credential.

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use pawlink_shared::models::{Announcement, Conversation, Message, MessageBatch, Page};
use pawlink_shared::types::{AnnouncementId, ConversationId, MessageId};

use crate::error::ApiError;

/// The request/response operations the sync engine consumes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// One page of the caller's conversations, newest activity first.
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, ApiError>;

    /// Up to `limit` most recent messages, ascending. `before_id` pages
    /// further back through the history.
    async fn list_messages(
        &self,
        conversation: ConversationId,
        limit: u32,
        before_id: Option<MessageId>,
    ) -> Result<MessageBatch, ApiError>;

    /// Move the caller's read cursor to now. Best effort.
    async fn mark_conversation_read(&self, conversation: ConversationId) -> Result<(), ApiError>;

    /// Send a message over HTTP; returns the canonical stored message.
    /// Fallback path for when no push transport is connected.
    async fn send_message(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<Message, ApiError>;

    /// Start (or fetch the existing) conversation about an announcement.
    async fn start_conversation(
        &self,
        announcement: AnnouncementId,
    ) -> Result<Conversation, ApiError>;

    /// All published announcements for the browse view.
    async fn list_announcements(&self) -> Result<Vec<Announcement>, ApiError>;
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    conversation_id: ConversationId,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct StartConversationBody {
    announcement_id: AnnouncementId,
}

/// `ChatApi` over reqwest against the REST backend.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl RestClient {
    /// `base` is the API root, e.g. `http://127.0.0.1:8001/api/`. A missing
    /// trailing slash is tolerated.
    pub fn new(base: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(&normalized)?,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    /// Map a non-2xx response to `ApiError::Status`, pulling the backend's
    /// `{"detail": ...}` body through when it is present.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let detail = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| extract_detail(&body))
            .unwrap_or_else(|| "request failed".to_string());
        Err(ApiError::Status { status, detail })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        Self::check(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Self::check(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn extract_detail(body: &serde_json::Value) -> Option<String> {
    body.get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_owned)
}

#[async_trait]
impl ChatApi for RestClient {
    async fn list_conversations(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Conversation>, ApiError> {
        let mut url = self.endpoint("chat/conversations/")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        self.get_json(url).await
    }

    async fn list_messages(
        &self,
        conversation: ConversationId,
        limit: u32,
        before_id: Option<MessageId>,
    ) -> Result<MessageBatch, ApiError> {
        let mut url = self.endpoint(&format!("chat/conversations/{conversation}/messages/"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &limit.to_string());
            if let Some(before) = before_id {
                pairs.append_pair("before_id", &before.to_string());
            }
        }
        self.get_json(url).await
    }

    async fn mark_conversation_read(&self, conversation: ConversationId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("chat/conversations/{conversation}/read/"))?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(resp).await.map(|_| ())
    }

    async fn send_message(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<Message, ApiError> {
        let url = self.endpoint("chat/messages/")?;
        let body = SendMessageBody {
            conversation_id: conversation,
            text,
        };
        self.post_json(url, &body).await
    }

    async fn start_conversation(
        &self,
        announcement: AnnouncementId,
    ) -> Result<Conversation, ApiError> {
        let url = self.endpoint("chat/start/")?;
        let body = StartConversationBody {
            announcement_id: announcement,
        };
        self.post_json(url, &body).await
    }

    async fn list_announcements(&self) -> Result<Vec<Announcement>, ApiError> {
        let url = self.endpoint("announcements/")?;
        self.get_json(url).await
    }
}
