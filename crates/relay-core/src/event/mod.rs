//! Chat events
//!
//! The normalized unit of upstream activity relayed to every subscriber.

mod chat_event;
mod kind;

pub use chat_event::{ChatEvent, Emote};
pub use kind::EventKind;
