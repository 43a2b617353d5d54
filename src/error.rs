//! Errors originating from transport I/O, protocol violations, and local misuse.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Underlying error from the websocket transport.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// A `send`/operation was attempted while the client was not connected.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called while already connected.
    #[error("already connected")]
    AlreadyConnected,

    /// The Conversation Store reducer rejected an event: unknown event type,
    /// a missing required field, or a reference to an unknown item/response id.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Local misuse not caused by the server: malformed tool registration,
    /// a non-object payload passed to `send`, or a builder left incomplete.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server reported an `error` event.
    #[error("{0}")]
    Server(RealtimeApiError),
}

/// The payload of a server-sent `error` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeApiError {
    pub r#type: Option<String>,
    pub code: Option<String>,
    pub message: String,
    pub param: Option<String>,
    pub event_id: Option<String>,
}

impl std::fmt::Display for RealtimeApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(r#type) = &self.r#type {
            parts.push(format!("{}:", r#type));
        }
        parts.push(self.message.clone());
        if let Some(param) = &self.param {
            parts.push(format!("(param: {param})"));
        }
        if let Some(code) = &self.code {
            parts.push(format!("(code: {code})"));
        }
        write!(f, "{}", parts.join(" "))
    }
}

pub(crate) fn map_deserialization_error(e: serde_json::Error, bytes: &[u8]) -> RealtimeError {
    let json_content = String::from_utf8_lossy(bytes);
    tracing::error!("failed to deserialize server frame: {}", json_content);
    RealtimeError::Protocol(format!("deserialize error: {e}"))
}
