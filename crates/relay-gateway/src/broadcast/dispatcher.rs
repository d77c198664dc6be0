//! Event dispatcher
//!
//! Receives events from the upstream listener and hands each one to every
//! open connection's outbound queue.

use crate::connection::{ConnectionRegistry, DeliveryError};
use relay_core::ChatEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of dispatching a single event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Connections the event was queued for
    pub delivered: usize,
    /// Connections dropped because their outbound buffer was full
    pub dropped: usize,
    /// Connections listed when the event was dispatched
    pub total: usize,
}

/// Fans events out to every registered connection
pub struct EventDispatcher {
    registry: Arc<ConnectionRegistry>,
    events: mpsc::Receiver<ChatEvent>,
}

impl EventDispatcher {
    /// Create a dispatcher draining `events`
    pub fn new(registry: Arc<ConnectionRegistry>, events: mpsc::Receiver<ChatEvent>) -> Self {
        Self { registry, events }
    }

    /// Spawn the dispatcher loop onto the runtime
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Dispatch events in arrival order until shutdown or until every
    /// publisher is gone
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Event dispatcher started");

        loop {
            let event = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                event = self.events.recv() => event,
            };

            match event {
                Some(event) => {
                    self.dispatch(Arc::new(event));
                }
                None => {
                    tracing::warn!("Event channel closed");
                    break;
                }
            }
        }

        tracing::info!("Event dispatcher stopped");
    }

    /// Hand one event to every open connection
    ///
    /// Never waits on a connection. A connection whose buffer is full is
    /// cancelled and does not receive the event.
    pub fn dispatch(&self, event: Arc<ChatEvent>) -> DispatchReport {
        let connections = self.registry.snapshot();
        let mut report = DispatchReport {
            total: connections.len(),
            ..DispatchReport::default()
        };

        for connection in &connections {
            if !connection.is_open() || connection.is_cancelled() {
                continue;
            }

            match connection.deliver(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(DeliveryError::Full) => {
                    tracing::warn!(
                        connection_id = %connection.id(),
                        "Subscriber is not keeping up, dropping connection"
                    );
                    connection.cancel();
                    report.dropped += 1;
                }
                Err(DeliveryError::Closed) => {}
            }
        }

        tracing::debug!(
            kind = %event.kind,
            sent = report.delivered,
            total = report.total,
            "Sent to {}/{} client(s)",
            report.delivered,
            report.total
        );

        report
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
