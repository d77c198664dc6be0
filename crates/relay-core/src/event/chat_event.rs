//! Chat event value and its JSON wire representation

use crate::error::EventError;
use crate::event::EventKind;
use serde::{Deserialize, Serialize};

/// An emote referenced by a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emote {
    pub name: String,
    pub id: String,
}

impl Emote {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// A normalized chat event
///
/// Produced once by the upstream listener and shared read-only between all
/// recipients. Field names follow the JSON schema consumed by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "msgType")]
    pub kind: EventKind,

    /// Source-assigned message id
    pub id: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    /// Hex color of the sender, may be empty
    #[serde(rename = "displayCol")]
    pub display_color: String,

    pub channel: String,

    #[serde(rename = "msg")]
    pub text: String,

    /// Unix seconds
    #[serde(rename = "time")]
    pub timestamp: i64,

    #[serde(default)]
    pub emotes: Vec<Emote>,
}

impl ChatEvent {
    /// Create a deletion notice for a previously relayed message
    ///
    /// Only `id` is populated; consumers key on `msgType` and ignore the rest.
    #[must_use]
    pub fn delete(target_id: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Delete,
            id: target_id.into(),
            ..Self::default()
        }
    }

    /// Serialize to the wire representation
    pub fn to_json(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(EventError::Serialize)
    }

    /// Parse from the wire representation
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        serde_json::from_str(json).map_err(EventError::Parse)
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.kind == EventKind::Delete
    }
}
