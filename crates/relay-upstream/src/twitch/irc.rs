//! IRC line parsing
//!
//! Twitch chat speaks IRC with IRCv3 message tags:
//! `@key=value;key2=value2 :prefix COMMAND param :trailing`.

use super::emotes::parse_emotes;
use crate::source::{IncomingMessage, UpstreamEvent};
use std::collections::HashMap;

const ACTION_PREFIX: &str = "\u{1}ACTION ";
const ACTION_SUFFIX: char = '\u{1}';

/// A parsed IRC line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line, without its `\r\n` terminator
    ///
    /// Returns `None` for blank or malformed lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.is_empty() {
            return None;
        }

        let mut tags = HashMap::new();
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, remainder) = stripped.split_once(' ')?;
            for pair in raw_tags.split(';').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                tags.insert(key.to_string(), unescape_tag_value(value));
            }
            rest = remainder.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw_prefix, remainder) = stripped.split_once(' ')?;
            prefix = Some(raw_prefix.to_string());
            rest = remainder.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, remainder)) => {
                    params.push(param.to_string());
                    rest = remainder;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Self {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Last parameter, which carries the message body
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Channel name from the first parameter, without `#`
    pub fn channel(&self) -> Option<&str> {
        self.params
            .first()
            .and_then(|p| p.strip_prefix('#'))
            .filter(|c| !c.is_empty())
    }

    /// Nickname part of the prefix (`nick!user@host`)
    pub fn nick(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .map(|p| p.split_once('!').map_or(p, |(nick, _)| nick))
    }

    /// Convert a `PRIVMSG` or `CLEARMSG` into an upstream event
    pub fn to_upstream_event(&self) -> Option<UpstreamEvent> {
        match self.command.as_str() {
            "PRIVMSG" => self.to_message().map(UpstreamEvent::Message),
            "CLEARMSG" => Some(UpstreamEvent::Deleted {
                channel: self.channel()?.to_string(),
                target_id: self.tag("target-msg-id").filter(|id| !id.is_empty())?.to_string(),
            }),
            _ => None,
        }
    }

    fn to_message(&self) -> Option<IncomingMessage> {
        let channel = self.channel()?;
        let raw_text = self.params.get(1)?;

        let (text, action) = match raw_text.strip_prefix(ACTION_PREFIX) {
            Some(body) => (body.strip_suffix(ACTION_SUFFIX).unwrap_or(body), true),
            None => (raw_text.as_str(), false),
        };

        let display_name = self
            .tag("display-name")
            .filter(|name| !name.is_empty())
            .or_else(|| self.nick())
            .unwrap_or_default();

        let timestamp = self
            .tag("tmi-sent-ts")
            .and_then(|ts| ts.parse::<i64>().ok())
            .map_or_else(|| chrono::Utc::now().timestamp(), |ms| ms.div_euclid(1000));

        Some(IncomingMessage {
            id: self.tag("id").unwrap_or_default().to_string(),
            display_name: display_name.to_string(),
            color: self.tag("color").unwrap_or_default().to_string(),
            channel: channel.to_string(),
            text: text.to_string(),
            action,
            timestamp,
            emotes: parse_emotes(self.tag("emotes").unwrap_or_default(), text),
        })
    }
}

/// Decode an IRCv3 tag value
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
