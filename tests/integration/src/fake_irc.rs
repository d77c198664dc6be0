//! Fake Twitch chat endpoint
//!
//! Accepts IRC-over-WebSocket clients on a local port, records every line
//! they send, and lets the test push lines to the most recent client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::helpers::WAIT_TIMEOUT;

/// A local stand-in for the Twitch IRC WebSocket endpoint
pub struct FakeIrcServer {
    addr: SocketAddr,
    /// Lines received from clients, in arrival order
    received: Arc<Mutex<Vec<String>>>,
    /// Outbound queue of the latest client
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
    handle: JoinHandle<()>,
}

impl FakeIrcServer {
    /// Bind to an ephemeral port and start accepting clients
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));
        let outbound = Arc::new(Mutex::new(None));

        let handle = tokio::spawn(accept_loop(listener, received.clone(), outbound.clone()));

        Ok(Self {
            addr,
            received,
            outbound,
            handle,
        })
    }

    /// URL to configure as the upstream endpoint
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send one IRC line to the connected client
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let outbound = self.outbound.lock().await;
        let Some(tx) = outbound.as_ref() else {
            anyhow::bail!("No client connected");
        };
        tx.send(format!("{line}\r\n"))
            .map_err(|_| anyhow::anyhow!("Client is gone"))
    }

    /// Lines received so far
    pub async fn received(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }

    /// Wait until a client has sent a line starting with `prefix`
    pub async fn wait_for_line(&self, prefix: &str) -> Result<String> {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Some(line) = self
                .received()
                .await
                .into_iter()
                .find(|line| line.starts_with(prefix))
            {
                return Ok(line);
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("No line starting with {prefix:?} received");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for FakeIrcServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    received: Arc<Mutex<Vec<String>>>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let Ok(socket) = tokio_tungstenite::accept_async(stream).await else {
            continue;
        };
        let (mut sink, mut stream) = socket.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *outbound.lock().await = Some(tx);

        tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let received = received.clone();
        tokio::spawn(async move {
            while let Some(Ok(message)) = stream.next().await {
                if let Message::Text(text) = message {
                    let mut lines = received.lock().await;
                    lines.extend(
                        text.split("\r\n")
                            .filter(|line| !line.is_empty())
                            .map(str::to_owned),
                    );
                }
            }
        });
    }
}
