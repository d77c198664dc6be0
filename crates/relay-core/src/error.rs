//! Domain errors

use thiserror::Error;

/// Errors produced while encoding or decoding a [`crate::ChatEvent`]
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse event: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Errors raised by a subscriber socket
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Frame read failed: {0}")]
    Read(String),

    #[error("Frame write failed: {0}")]
    Write(String),

    #[error("Socket closed")]
    Closed,
}
