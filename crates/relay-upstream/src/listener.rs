//! Upstream listener
//!
//! Keeps a session with the chat source open, normalizes every event it
//! yields, and publishes the result onto the dispatcher's event channel.

use crate::error::UpstreamError;
use crate::reconnect::ReconnectPolicy;
use crate::source::{ChatSession, ChatSource};
use relay_core::ChatEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Why a session stopped producing events
#[derive(Debug)]
enum SessionEnd {
    Shutdown,
    PublisherClosed,
    Closed,
    Failed(UpstreamError),
}

/// Relays chat source activity into the event channel
pub struct UpstreamListener {
    source: Arc<dyn ChatSource>,
    channels: Vec<String>,
    policy: ReconnectPolicy,
    publisher: mpsc::Sender<ChatEvent>,
}

impl UpstreamListener {
    /// Create a new listener
    pub fn new(
        source: Arc<dyn ChatSource>,
        channels: Vec<String>,
        policy: ReconnectPolicy,
        publisher: mpsc::Sender<ChatEvent>,
    ) -> Self {
        Self {
            source,
            channels,
            policy,
            publisher,
        }
    }

    /// Spawn the listener loop onto the runtime
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Connect, relay, and reconnect until shutdown
    ///
    /// Connection failures never end the loop; only `shutdown` or the loss of
    /// the dispatcher does.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(channels = ?self.channels, "Upstream listener started");
        let mut attempt: u32 = 0;

        loop {
            let connected = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                result = self.source.connect(&self.channels) => result,
            };

            match connected {
                Ok(session) => {
                    attempt = 0;
                    tracing::info!(channels = ?self.channels, "Connected to chat source");

                    match self.relay_session(session, &shutdown).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::PublisherClosed => {
                            tracing::warn!("Event channel closed, stopping upstream listener");
                            break;
                        }
                        SessionEnd::Closed => {
                            tracing::warn!("Chat source ended the session, reconnecting...");
                        }
                        SessionEnd::Failed(e) => {
                            tracing::warn!(error = %e, "Chat session failed, reconnecting...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "Failed to connect to chat source"
                    );
                }
            }

            attempt = attempt.saturating_add(1);
            let delay = self.policy.delay(attempt);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Waiting before reconnect"
            );

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!("Upstream listener stopped");
    }

    async fn relay_session(
        &self,
        mut session: Box<dyn ChatSession>,
        shutdown: &CancellationToken,
    ) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => return SessionEnd::Shutdown,
                next = session.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) => ChatEvent::from(event),
                Ok(None) => return SessionEnd::Closed,
                Err(e) => return SessionEnd::Failed(e),
            };

            tracing::debug!(
                kind = %event.kind,
                channel = %event.channel,
                user = %event.display_name,
                id = %event.id,
                "Upstream event"
            );

            // Waits here while the dispatcher is behind.
            let published = tokio::select! {
                biased;
                () = shutdown.cancelled() => return SessionEnd::Shutdown,
                result = self.publisher.send(event) => result,
            };

            if published.is_err() {
                return SessionEnd::PublisherClosed;
            }
        }
    }
}

impl std::fmt::Debug for UpstreamListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamListener")
            .field("channels", &self.channels)
            .field("policy", &self.policy)
            .finish()
    }
}
