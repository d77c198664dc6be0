//! Upstream error types

use tokio_tungstenite::tungstenite;

/// Error type for upstream operations
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Failed to connect to chat source: {0}")]
    Connect(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;
