//! Connection management
//!
//! Subscriber connections, the registry that lists them, and the two tasks
//! that run each one.

mod connection;
mod lifecycle;
mod reader;
mod registry;
mod writer;

pub use connection::{Connection, ConnectionId, DeliveryError, WriterState};
pub use lifecycle::{open_connection, ConnectionTasks};
pub use reader::{run_reader, DisconnectReason};
pub use registry::ConnectionRegistry;
pub use writer::{run_writer, WriterExit};
