//! Reader task
//!
//! Consumes inbound frames for liveness and owns connection teardown: it is
//! the only code path that removes a connection from the registry.

use super::{Connection, ConnectionRegistry};
use relay_core::{Frame, FrameSource, SocketError};
use std::sync::Arc;

/// Why a reader task ended
#[derive(Debug)]
pub enum DisconnectReason {
    /// The peer sent a close frame
    PeerClosed,
    /// The inbound stream ended without a close frame
    StreamEnded,
    ReadFailed(SocketError),
    EchoFailed(SocketError),
    /// The connection's token was cancelled
    Cancelled,
}

impl DisconnectReason {
    /// Check whether the connection ended because of a socket error
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::ReadFailed(_) | Self::EchoFailed(_))
    }
}

/// Run the reader loop for `connection`, then tear it down
pub async fn run_reader(
    connection: Arc<Connection>,
    mut source: Box<dyn FrameSource>,
    registry: Arc<ConnectionRegistry>,
) -> DisconnectReason {
    let cancel = connection.cancellation_token().clone();

    let reason = loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break DisconnectReason::Cancelled,
            next = source.next_frame() => next,
        };

        match next {
            Some(Ok(frame @ (Frame::Text(_) | Frame::Binary(_)))) => {
                // Echo is for liveness only; nobody acts on the content.
                let echoed = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break DisconnectReason::Cancelled,
                    result = connection.write_frame(frame) => result,
                };
                if let Err(e) = echoed {
                    break DisconnectReason::EchoFailed(e);
                }
            }
            Some(Ok(Frame::Ping(_) | Frame::Pong(_))) => {}
            Some(Ok(Frame::Close)) => break DisconnectReason::PeerClosed,
            Some(Err(e)) => break DisconnectReason::ReadFailed(e),
            None => break DisconnectReason::StreamEnded,
        }
    };

    teardown(&connection, &registry);

    let age = connection.age();
    if reason.is_error() {
        tracing::warn!(
            connection_id = %connection.id(),
            reason = ?reason,
            age = ?age,
            "Connection lost"
        );
    } else {
        tracing::debug!(
            connection_id = %connection.id(),
            reason = ?reason,
            age = ?age,
            "Connection ended"
        );
    }
    reason
}

/// Close, delist, and cancel a connection
fn teardown(connection: &Connection, registry: &ConnectionRegistry) {
    if connection.mark_closed() {
        registry.remove(connection.id());
    }
    connection.cancel();
}
