//! Event broadcasting
//!
//! Distributes events from the upstream listener to subscriber connections.

mod dispatcher;

pub use dispatcher::{DispatchReport, EventDispatcher};
