//! In-memory socket transport
//!
//! Channel-backed [`FrameSink`]/[`FrameSource`] pairs for driving the relay
//! without a network. The peer side is exposed as [`MemoryPeer`].

use super::{Frame, FrameSink, FrameSource};
use crate::error::SocketError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Create a connected in-memory socket
///
/// The returned sink and source belong to the relay side; the peer observes
/// written frames and injects inbound ones.
#[must_use]
pub fn socket_pair() -> (MemorySink, MemorySource, MemoryPeer) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let fail_writes = Arc::new(AtomicBool::new(false));

    let sink = MemorySink {
        frames: outbound_tx,
        fail_writes: fail_writes.clone(),
    };
    let source = MemorySource { inbound: inbound_rx };
    let peer = MemoryPeer {
        received: outbound_rx,
        inbound: Some(inbound_tx),
        fail_writes,
    };

    (sink, source, peer)
}

/// Relay-side write half
#[derive(Debug)]
pub struct MemorySink {
    frames: mpsc::UnboundedSender<Frame>,
    fail_writes: Arc<AtomicBool>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, frame: Frame) -> Result<(), SocketError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SocketError::Write("injected write failure".to_string()));
        }
        self.frames.send(frame).map_err(|_| SocketError::Closed)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.frames.send(Frame::Close).map_err(|_| SocketError::Closed)
    }
}

/// Relay-side read half
#[derive(Debug)]
pub struct MemorySource {
    inbound: mpsc::UnboundedReceiver<Result<Frame, SocketError>>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<Frame, SocketError>> {
        self.inbound.recv().await
    }
}

/// The remote end of an in-memory socket
#[derive(Debug)]
pub struct MemoryPeer {
    received: mpsc::UnboundedReceiver<Frame>,
    inbound: Option<mpsc::UnboundedSender<Result<Frame, SocketError>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Send a frame to the relay
    pub fn send(&self, frame: Frame) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(frame)).is_ok())
    }

    /// Deliver a read error to the relay
    pub fn fail_read(&self, reason: &str) -> bool {
        self.inbound
            .as_ref()
            .is_some_and(|tx| tx.send(Err(SocketError::Read(reason.to_string()))).is_ok())
    }

    /// Drop the inbound half; the relay observes end-of-stream
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Make every later write on the relay side fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Wait for the next frame written by the relay
    pub async fn recv(&mut self) -> Option<Frame> {
        self.received.recv().await
    }

    /// Take a frame written by the relay without waiting
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.received.try_recv().ok()
    }
}

/// A sink whose writes never complete
///
/// Models a subscriber that stopped reading and whose TCP window is full.
#[derive(Debug, Default)]
pub struct StalledSink;

#[async_trait]
impl FrameSink for StalledSink {
    async fn send_frame(&mut self, _frame: Frame) -> Result<(), SocketError> {
        std::future::pending().await
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        Ok(())
    }
}
