//! Application configuration structs
//!
//! Loads configuration from an optional JSON file and `RELAY_*` environment
//! variables, in that order of precedence (environment wins).

use serde::Deserialize;
use std::env;

/// Config file read when `RELAY_CONFIG_FILE` is not set
pub const DEFAULT_CONFIG_FILE: &str = "stconfig.json";

/// Environment variable overriding the config file path
pub const CONFIG_FILE_VAR: &str = "RELAY_CONFIG_FILE";

/// Twitch chat over WebSocket
pub const DEFAULT_UPSTREAM_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

const ENV_PREFIX: &str = "RELAY";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub relay: RelaySettings,

    /// Flat `port` key of older config files
    #[serde(default, rename = "port")]
    legacy_port: Option<u16>,

    /// Flat `channels` key of older config files
    #[serde(default, rename = "channels")]
    legacy_channels: Option<Vec<String>>,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: Environment::default(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Listener configuration for the subscriber endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How the upstream listener waits between connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectMode {
    /// Constant delay between attempts
    #[default]
    Fixed,
    /// Exponential backoff with jitter, capped at `backoff_max_ms`
    Backoff,
}

/// Upstream chat source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub reconnect: ReconnectMode,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_backoff_jitter")]
    pub backoff_jitter: f64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            channels: default_channels(),
            reconnect: ReconnectMode::default(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            backoff_jitter: default_backoff_jitter(),
        }
    }
}

/// Fan-out buffer sizes
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    /// Capacity of the channel between the upstream listener and the dispatcher
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Capacity of each subscriber's outbound queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-relay".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    42069
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_channels() -> Vec<String> {
    vec!["kewliomzx".to_string()]
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

fn default_backoff_jitter() -> f64 {
    0.2
}

fn default_event_buffer() -> usize {
    64
}

fn default_outbound_buffer() -> usize {
    100
}

impl AppConfig {
    /// Load configuration from `.env`, the config file, and the environment
    ///
    /// # Errors
    /// Returns an error if a source cannot be parsed or a value is invalid
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let path = env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from a specific file path plus the environment
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let source = ::config::Config::builder()
            .add_source(::config::File::new(path, ::config::FileFormat::Json).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upstream.channels")
                    .try_parsing(true),
            )
            .build()?;

        source.try_deserialize::<Self>()?.normalized()
    }

    /// Apply legacy keys and fallbacks, then validate
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        if let Some(port) = self.legacy_port.take() {
            self.server.port = port;
        }
        if let Some(channels) = self.legacy_channels.take() {
            self.upstream.channels = channels;
        }

        if self.server.port == 0 {
            self.server.port = default_port();
        }

        self.upstream.channels = self
            .upstream
            .channels
            .iter()
            .map(|c| c.trim().trim_start_matches('#').to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if self.upstream.channels.is_empty() {
            self.upstream.channels = default_channels();
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "relay.event_buffer",
                "must be greater than zero".to_string(),
            ));
        }
        if self.relay.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "relay.outbound_buffer",
                "must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.upstream.backoff_jitter) {
            return Err(ConfigError::InvalidValue(
                "upstream.backoff_jitter",
                format!("{} is outside 0.0..=1.0", self.upstream.backoff_jitter),
            ));
        }
        if self.upstream.reconnect == ReconnectMode::Backoff
            && self.upstream.backoff_max_ms < self.upstream.reconnect_delay_ms
        {
            return Err(ConfigError::InvalidValue(
                "upstream.backoff_max_ms",
                "must not be below upstream.reconnect_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
