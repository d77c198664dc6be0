//! axum WebSocket adapters
//!
//! Wrap the split halves of an upgraded [`WebSocket`] as a [`FrameSink`] and
//! a [`FrameSource`].

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_core::{Frame, FrameSink, FrameSource, SocketError};

/// Write half of an upgraded WebSocket
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError> {
        self.inner
            .send(into_message(frame))
            .await
            .map_err(|e| SocketError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.inner
            .close()
            .await
            .map_err(|e| SocketError::Write(e.to_string()))
    }
}

/// Read half of an upgraded WebSocket
pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

impl WsSource {
    pub fn new(inner: SplitStream<WebSocket>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<Frame, SocketError>> {
        let message = self.inner.next().await?;
        Some(
            message
                .map(from_message)
                .map_err(|e| SocketError::Read(e.to_string())),
        )
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}

fn from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(_) => Frame::Close,
    }
}
