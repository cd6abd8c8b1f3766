//! Client configuration loaded from environment variables.
//!
//! All settings have local-development defaults except the access token,
//! which stays `None` until the user authenticates; no push connection is
//! ever attempted without one.

use pawlink_shared::types::UserId;

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API root.
    /// Env: `PAWLINK_API_URL`
    /// Default: `http://127.0.0.1:8001/api/`
    pub api_url: String,

    /// Push (WebSocket) endpoint root.
    /// Env: `PAWLINK_WS_URL`
    /// Default: `ws://127.0.0.1:8001`
    pub ws_url: String,

    /// Bearer credential carried on every request and on the push
    /// connection query string.
    /// Env: `PAWLINK_ACCESS_TOKEN`
    /// Default: none (unauthenticated).
    pub access_token: Option<String>,

    /// The authenticated user's id; used to tell echoes of our own
    /// messages apart from counterpart messages.
    /// Env: `PAWLINK_USER_ID`
    /// Default: `0`.
    pub user_id: UserId,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("PAWLINK_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8001/api/".to_string()),
            ws_url: std::env::var("PAWLINK_WS_URL")
                .unwrap_or_else(|_| "ws://127.0.0.1:8001".to_string()),
            access_token: std::env::var("PAWLINK_ACCESS_TOKEN").ok(),
            user_id: UserId(
                std::env::var("PAWLINK_USER_ID")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
            ),
        }
    }

    pub fn new(
        api_url: impl Into<String>,
        ws_url: impl Into<String>,
        access_token: Option<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            ws_url: ws_url.into(),
            access_token,
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_construction() {
        let config = ClientConfig::new(
            "http://localhost/api/",
            "ws://localhost",
            Some("tok".into()),
            UserId(5),
        );
        assert_eq!(config.user_id, UserId(5));
        assert_eq!(config.access_token.as_deref(), Some("tok"));
    }
}
