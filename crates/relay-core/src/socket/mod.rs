//! Subscriber socket abstraction
//!
//! The gateway never touches a concrete WebSocket type. It reads and writes
//! [`Frame`]s through [`FrameSource`] and [`FrameSink`], which lets the relay
//! logic run against the real transport or, with the `test-util` feature, the
//! in-memory one in `memory`.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use crate::error::SocketError;
use async_trait::async_trait;

/// A single protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Write half of a subscriber socket
#[async_trait]
pub trait FrameSink: Send {
    /// Transmit one frame
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError>;

    /// Close the write half
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Read half of a subscriber socket
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame
    ///
    /// Returns `None` once the peer is gone.
    async fn next_frame(&mut self) -> Option<Result<Frame, SocketError>>;
}
