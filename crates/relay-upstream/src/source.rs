//! Chat source abstraction
//!
//! A [`ChatSource`] opens sessions against the external chat service; a
//! [`ChatSession`] yields the two categories of activity the relay consumes.

use crate::error::UpstreamResult;
use async_trait::async_trait;
use relay_core::{ChatEvent, Emote, EventKind};

/// A chat message as received from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: String,
    pub display_name: String,
    pub color: String,
    pub channel: String,
    pub text: String,
    /// `/me` message
    pub action: bool,
    /// Unix seconds
    pub timestamp: i64,
    pub emotes: Vec<Emote>,
}

/// Activity reported by a chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// A message was posted
    Message(IncomingMessage),
    /// A moderator deleted a message
    Deleted { channel: String, target_id: String },
}

impl From<UpstreamEvent> for ChatEvent {
    fn from(event: UpstreamEvent) -> Self {
        match event {
            UpstreamEvent::Message(msg) => ChatEvent {
                kind: if msg.action {
                    EventKind::Action
                } else {
                    EventKind::Message
                },
                id: msg.id,
                display_name: msg.display_name,
                display_color: msg.color,
                channel: msg.channel,
                text: msg.text,
                timestamp: msg.timestamp,
                emotes: msg.emotes,
            },
            UpstreamEvent::Deleted { target_id, .. } => ChatEvent::delete(target_id),
        }
    }
}

/// Opens sessions against a chat service
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Connect and join the given channels
    async fn connect(&self, channels: &[String]) -> UpstreamResult<Box<dyn ChatSession>>;
}

/// An established connection to a chat service
#[async_trait]
pub trait ChatSession: Send {
    /// Wait for the next relevant event
    ///
    /// Returns `Ok(None)` when the service ended the session.
    async fn next_event(&mut self) -> UpstreamResult<Option<UpstreamEvent>>;
}
