//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, Environment, ReconnectMode, RelaySettings, ServerConfig,
    UpstreamConfig, CONFIG_FILE_VAR, DEFAULT_CONFIG_FILE, DEFAULT_UPSTREAM_URL,
};
