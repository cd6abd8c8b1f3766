use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Transport is not connected")]
    NotConnected,
}
