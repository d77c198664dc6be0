//! # relay-upstream
//!
//! Connects to the external chat source, normalizes its activity into
//! [`relay_core::ChatEvent`]s, and publishes them to the dispatcher. Connection
//! failures are retried forever according to a [`ReconnectPolicy`].

pub mod error;
pub mod listener;
pub mod reconnect;
pub mod source;
pub mod twitch;

pub use error::{UpstreamError, UpstreamResult};
pub use listener::UpstreamListener;
pub use reconnect::ReconnectPolicy;
pub use source::{ChatSession, ChatSource, IncomingMessage, UpstreamEvent};
pub use twitch::TwitchConnector;
