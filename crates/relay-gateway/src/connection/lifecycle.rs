//! Connection lifecycle
//!
//! Registers a new subscriber and starts its writer and reader tasks.

use super::{
    run_reader, run_writer, Connection, ConnectionRegistry, DisconnectReason, WriterExit,
};
use relay_core::{FrameSink, FrameSource};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handles to a running connection
#[derive(Debug)]
pub struct ConnectionTasks {
    pub connection: Arc<Connection>,
    pub writer: JoinHandle<WriterExit>,
    pub reader: JoinHandle<DisconnectReason>,
}

/// Register a connection over `sink`/`source` and spawn its tasks
///
/// The connection is listed before its reader starts, so a reader that ends
/// immediately still finds it in the registry to remove.
pub fn open_connection(
    registry: &Arc<ConnectionRegistry>,
    sink: Box<dyn FrameSink>,
    source: Box<dyn FrameSource>,
    outbound_buffer: usize,
) -> ConnectionTasks {
    let (connection, outbound) = Connection::new(sink, outbound_buffer);
    registry.insert(connection.clone());

    let writer = tokio::spawn(run_writer(connection.clone(), outbound));
    let reader = tokio::spawn(run_reader(connection.clone(), source, registry.clone()));

    ConnectionTasks {
        connection,
        writer,
        reader,
    }
}
