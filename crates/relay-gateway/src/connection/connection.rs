//! Individual subscriber connection
//!
//! Owns the write half of the socket, the outbound event queue that feeds the
//! writer task, and the cancellation token that ends both per-connection
//! tasks.

use relay_core::{ChatEvent, Frame, FrameSink, SocketError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next identifier
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a connection's writer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriterState {
    NotStarted = 0,
    Running = 1,
    Stopped = 2,
}

impl WriterState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Stopped,
            _ => Self::NotStarted,
        }
    }
}

/// Why an event could not be queued for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Outbound buffer is full")]
    Full,

    #[error("Writer is gone")]
    Closed,
}

/// A single subscriber connection
pub struct Connection {
    id: ConnectionId,

    /// Write half, shared by the writer's events and the reader's echoes
    sink: Mutex<Box<dyn FrameSink>>,

    open: AtomicBool,

    /// Queue drained by the writer task
    outbound: mpsc::Sender<Arc<ChatEvent>>,

    /// Cancelled once the connection must go away
    cancel: CancellationToken,

    writer_state: AtomicU8,

    created_at: Instant,
}

impl Connection {
    /// Create an open connection and the receiving end of its outbound queue
    ///
    /// A zero `buffer` is raised to one.
    pub fn new(
        sink: Box<dyn FrameSink>,
        buffer: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Arc<ChatEvent>>) {
        let (outbound, rx) = mpsc::channel(buffer.max(1));

        let connection = Arc::new(Self {
            id: ConnectionId::next(),
            sink: Mutex::new(sink),
            open: AtomicBool::new(true),
            outbound,
            cancel: CancellationToken::new(),
            writer_state: AtomicU8::new(WriterState::NotStarted as u8),
            created_at: Instant::now(),
        });

        (connection, rx)
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Flip the connection to closed
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::SeqCst)
    }

    /// Queue an event for the writer without waiting
    pub fn deliver(&self, event: Arc<ChatEvent>) -> Result<(), DeliveryError> {
        self.outbound.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Write one frame under the connection's write lock
    pub async fn write_frame(&self, frame: Frame) -> Result<(), SocketError> {
        self.sink.lock().await.send_frame(frame).await
    }

    /// Close the write half
    pub async fn close_sink(&self) -> Result<(), SocketError> {
        self.sink.lock().await.close().await
    }

    /// Ask both connection tasks to stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn writer_state(&self) -> WriterState {
        WriterState::from_u8(self.writer_state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_writer_state(&self, state: WriterState) {
        self.writer_state.store(state as u8, Ordering::SeqCst);
    }

    /// Get connection age
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .field("writer_state", &self.writer_state())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
