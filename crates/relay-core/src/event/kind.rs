//! Event kinds
//!
//! Serialized as the integer `msgType` field of the wire schema.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Kind of a relayed chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EventKind {
    /// Unrecognized upstream activity
    #[default]
    Unknown = 0,
    /// Ordinary chat message
    Message = 1,
    /// `/me` action message
    Action = 2,
    /// A previously relayed message was deleted
    Delete = 3,
}

impl EventKind {
    /// Create an `EventKind` from its wire value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::Message),
            2 => Some(Self::Action),
            3 => Some(Self::Delete),
            _ => None,
        }
    }

    /// Get the wire value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Message => "message",
            Self::Action => "action",
            Self::Delete => "delete",
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid msgType: {value}")))
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
