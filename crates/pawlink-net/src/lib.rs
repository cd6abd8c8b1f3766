// Collaborator boundary: the REST API client and the push transport.

pub mod api;
pub mod error;
pub mod transport;
pub mod ws;

pub use api::{ChatApi, RestClient};
pub use error::{ApiError, TransportError};
pub use transport::{PushConnector, PushStream};
pub use ws::WsConnector;
