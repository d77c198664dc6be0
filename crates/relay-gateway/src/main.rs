//! Chat relay entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-gateway
//! ```
//!
//! Configuration is read from `stconfig.json` (or `RELAY_CONFIG_FILE`) and
//! `RELAY_*` environment variables.

use relay_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(AppError::from(e).exit_code());
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        let e = AppError::from(e);
        eprintln!("Warning: {e} ({})", e.error_code());
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        port = config.server.port,
        channels = ?config.upstream.channels,
        "Configuration loaded"
    );

    if let Err(e) = relay_gateway::run(config).await {
        error!(error = %e, code = e.error_code(), "Relay failed");
        std::process::exit(e.exit_code());
    }
}
