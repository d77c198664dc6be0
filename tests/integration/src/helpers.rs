//! Test helpers for integration tests
//!
//! Provides a gateway running on an ephemeral port, a chat source the test
//! drives directly, and WebSocket subscriber utilities.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use relay_common::{AppConfig, AppResult};
use relay_core::ChatEvent;
use relay_upstream::{ChatSession, ChatSource, UpstreamError, UpstreamEvent, UpstreamResult};
use reqwest::{Client, Response, StatusCode};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

/// How long a helper waits before giving up
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A subscriber connected to the gateway
pub type Subscriber = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Chat source fed by the test through an mpsc channel
///
/// Serves a single session; later connects fail.
pub struct ChannelSource {
    events: Mutex<Option<mpsc::Receiver<UpstreamEvent>>>,
}

impl ChannelSource {
    pub fn new() -> (Arc<Self>, mpsc::Sender<UpstreamEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let source = Arc::new(Self {
            events: Mutex::new(Some(rx)),
        });
        (source, tx)
    }
}

#[async_trait]
impl ChatSource for ChannelSource {
    async fn connect(&self, _channels: &[String]) -> UpstreamResult<Box<dyn ChatSession>> {
        match self.events.lock().await.take() {
            Some(events) => Ok(Box::new(ChannelSession { events })),
            None => Err(UpstreamError::Connect("source already used".to_string())),
        }
    }
}

struct ChannelSession {
    events: mpsc::Receiver<UpstreamEvent>,
}

#[async_trait]
impl ChatSession for ChannelSession {
    async fn next_event(&mut self) -> UpstreamResult<Option<UpstreamEvent>> {
        Ok(self.events.recv().await)
    }
}

/// Gateway instance that manages lifecycle
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: Client,
    shutdown: CancellationToken,
    handle: JoinHandle<AppResult<()>>,
}

impl TestGateway {
    /// Start a gateway whose upstream events come from the returned sender
    pub async fn start() -> Result<(Self, mpsc::Sender<UpstreamEvent>)> {
        let (source, events) = ChannelSource::new();
        let gateway = Self::start_with_source(test_config(), source).await?;
        Ok((gateway, events))
    }

    /// Start a gateway over any chat source
    pub async fn start_with_source(config: AppConfig, source: Arc<dyn ChatSource>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(relay_gateway::serve(
            config,
            listener,
            source,
            shutdown.clone(),
        ));

        let client = Client::builder().timeout(WAIT_TIMEOUT).build()?;

        Ok(Self {
            addr,
            client,
            shutdown,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the subscriber endpoint URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Read the live subscriber count from `/stats`
    pub async fn connections(&self) -> Result<u64> {
        let stats: serde_json::Value = assert_json(self.get("/stats").await?, StatusCode::OK).await?;
        stats["connections"]
            .as_u64()
            .context("stats response has no connection count")
    }

    /// Poll `/stats` until exactly `expected` subscribers are registered
    pub async fn wait_for_connections(&self, expected: u64) -> Result<()> {
        let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
        loop {
            let current = self.connections().await?;
            if current == expected {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Expected {expected} connection(s), still at {current}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Connect a subscriber and wait until the gateway has registered it
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let before = self.connections().await?;
        let (socket, _response) = tokio_tungstenite::connect_async(self.ws_url()).await?;
        self.wait_for_connections(before + 1).await?;
        Ok(socket)
    }

    /// Stop the gateway and wait for it to finish
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.handle.await??;
        Ok(())
    }
}

/// Create a test configuration
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

/// Wait for the next relayed event on a subscriber
///
/// Control frames are skipped.
pub async fn next_event(subscriber: &mut Subscriber) -> Result<ChatEvent> {
    let text = next_text(subscriber).await?;
    Ok(ChatEvent::from_json(&text)?)
}

/// Wait for the next text frame on a subscriber
pub async fn next_text(subscriber: &mut Subscriber) -> Result<String> {
    tokio::time::timeout(WAIT_TIMEOUT, read_text(subscriber))
        .await
        .context("Timed out waiting for a text frame")?
}

async fn read_text(subscriber: &mut Subscriber) -> Result<String> {
    while let Some(message) = subscriber.next().await {
        match message? {
            Message::Text(text) => return Ok(text),
            Message::Ping(_) | Message::Pong(_) => {}
            other => anyhow::bail!("Unexpected frame: {other:?}"),
        }
    }
    anyhow::bail!("Subscriber stream ended")
}

/// Send a text frame from a subscriber
pub async fn send_text(subscriber: &mut Subscriber, text: &str) -> Result<()> {
    subscriber.send(Message::Text(text.to_string())).await?;
    Ok(())
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: serde::de::DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}
