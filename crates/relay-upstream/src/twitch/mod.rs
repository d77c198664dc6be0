//! Twitch chat source
//!
//! Joins channels anonymously over Twitch's IRC-over-WebSocket endpoint and
//! turns `PRIVMSG`/`CLEARMSG` traffic into [`UpstreamEvent`]s.

mod emotes;
mod irc;

pub use emotes::parse_emotes;
pub use irc::IrcMessage;

use crate::error::{UpstreamError, UpstreamResult};
use crate::source::{ChatSession, ChatSource, UpstreamEvent};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::collections::VecDeque;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Password accepted for anonymous `justinfan` logins
const ANONYMOUS_PASS: &str = "SCHMOOPIIE";

/// Capabilities needed for message tags and CLEARMSG
const CAPABILITIES: &str = "twitch.tv/tags twitch.tv/commands";

type IrcSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to Twitch chat as an anonymous reader
#[derive(Debug, Clone)]
pub struct TwitchConnector {
    url: String,
}

impl TwitchConnector {
    /// Create a connector for the given IRC WebSocket URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    fn anonymous_nick() -> String {
        format!("justinfan{}", rand::thread_rng().gen_range(10_000..100_000))
    }
}

#[async_trait]
impl ChatSource for TwitchConnector {
    async fn connect(&self, channels: &[String]) -> UpstreamResult<Box<dyn ChatSession>> {
        let nick = Self::anonymous_nick();

        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        let mut session = TwitchSession::new(socket);
        session.login(&nick, channels).await?;

        tracing::debug!(url = %self.url, nick = %nick, "Logged in to Twitch chat");
        Ok(Box::new(session))
    }
}

/// An open Twitch chat connection
pub struct TwitchSession {
    socket: IrcSocket,
    /// Lines received but not yet handled; one frame may carry several
    pending: VecDeque<String>,
}

impl TwitchSession {
    fn new(socket: IrcSocket) -> Self {
        Self {
            socket,
            pending: VecDeque::new(),
        }
    }

    async fn send_line(&mut self, line: String) -> UpstreamResult<()> {
        self.socket.send(Message::Text(line)).await?;
        Ok(())
    }

    async fn login(&mut self, nick: &str, channels: &[String]) -> UpstreamResult<()> {
        self.send_line(format!("CAP REQ :{CAPABILITIES}")).await?;
        self.send_line(format!("PASS {ANONYMOUS_PASS}")).await?;
        self.send_line(format!("NICK {nick}")).await?;

        if let Some(join) = join_command(channels) {
            self.send_line(join).await?;
        }
        Ok(())
    }

    /// Handle one buffered line, returning an event if it carries one
    async fn handle_line(&mut self, line: &str) -> UpstreamResult<LineOutcome> {
        let Some(msg) = IrcMessage::parse(line) else {
            return Ok(LineOutcome::Ignored);
        };

        match msg.command.as_str() {
            "PING" => {
                let payload = msg.trailing().unwrap_or("tmi.twitch.tv").to_string();
                self.send_line(format!("PONG :{payload}")).await?;
                Ok(LineOutcome::Ignored)
            }
            "RECONNECT" => Ok(LineOutcome::SessionEnded),
            "NOTICE" if msg.params.first().is_some_and(|target| target == "*") => Err(
                UpstreamError::Protocol(msg.trailing().unwrap_or("NOTICE").to_string()),
            ),
            _ => Ok(msg
                .to_upstream_event()
                .map_or(LineOutcome::Ignored, LineOutcome::Event)),
        }
    }
}

#[derive(Debug)]
enum LineOutcome {
    Event(UpstreamEvent),
    SessionEnded,
    Ignored,
}

#[async_trait]
impl ChatSession for TwitchSession {
    async fn next_event(&mut self) -> UpstreamResult<Option<UpstreamEvent>> {
        loop {
            while let Some(line) = self.pending.pop_front() {
                match self.handle_line(&line).await? {
                    LineOutcome::Event(event) => return Ok(Some(event)),
                    LineOutcome::SessionEnded => return Ok(None),
                    LineOutcome::Ignored => {}
                }
            }

            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => self.pending.extend(split_lines(&text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for TwitchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchSession")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Build a single `JOIN` for all channels
fn join_command(channels: &[String]) -> Option<String> {
    let names: Vec<String> = channels
        .iter()
        .map(|c| c.trim().trim_start_matches('#').to_lowercase())
        .filter(|c| !c.is_empty())
        .map(|c| format!("#{c}"))
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(format!("JOIN {}", names.join(",")))
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split("\r\n")
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
}
