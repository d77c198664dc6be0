//! # relay-core
//!
//! Domain layer for the chat relay: the normalized [`ChatEvent`], its JSON wire
//! representation, and the frame-level socket abstraction the gateway writes to.
//! This crate has no dependency on the web framework or the upstream client.

pub mod error;
pub mod event;
pub mod socket;

// Re-export commonly used types at crate root
pub use error::{EventError, SocketError};
pub use event::{ChatEvent, Emote, EventKind};
pub use socket::{Frame, FrameSink, FrameSource};
