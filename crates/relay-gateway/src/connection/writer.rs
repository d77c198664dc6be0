//! Writer task
//!
//! Drains a connection's outbound queue onto its socket, one JSON text frame
//! per event.

use super::{Connection, WriterState};
use relay_core::{ChatEvent, Frame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Upper bound on waiting for the close frame to go out
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a writer task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterExit {
    /// The connection's token was cancelled
    Cancelled,
    /// Every sender of the outbound queue is gone
    ChannelClosed,
    /// The connection was already closed when an event arrived
    ConnectionClosed,
    /// A frame could not be written
    WriteFailed,
}

/// Run the writer loop for `connection` until it stops
///
/// A failed write cancels the connection so its reader tears it down.
pub async fn run_writer(
    connection: Arc<Connection>,
    mut outbound: mpsc::Receiver<Arc<ChatEvent>>,
) -> WriterExit {
    connection.set_writer_state(WriterState::Running);
    let cancel = connection.cancellation_token().clone();
    let id = connection.id();

    let exit = loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break WriterExit::Cancelled,
            event = outbound.recv() => match event {
                Some(event) => event,
                None => break WriterExit::ChannelClosed,
            },
        };

        if !connection.is_open() {
            break WriterExit::ConnectionClosed;
        }

        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(connection_id = %id, error = %e, "Skipping event");
                continue;
            }
        };

        let written = tokio::select! {
            biased;
            () = cancel.cancelled() => break WriterExit::Cancelled,
            result = connection.write_frame(Frame::Text(json)) => result,
        };

        if let Err(e) = written {
            tracing::warn!(connection_id = %id, error = %e, "Failed to write event");
            connection.cancel();
            break WriterExit::WriteFailed;
        }
    };

    if exit != WriterExit::WriteFailed {
        match tokio::time::timeout(CLOSE_TIMEOUT, connection.close_sink()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(connection_id = %id, error = %e, "Close failed"),
            Err(_) => tracing::debug!(connection_id = %id, "Close timed out"),
        }
    }

    connection.set_writer_state(WriterState::Stopped);
    tracing::debug!(connection_id = %id, exit = ?exit, "Writer stopped");
    exit
}
