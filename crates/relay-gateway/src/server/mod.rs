//! Gateway server setup
//!
//! Routes, the relay pipeline, and the serve loop.

mod handler;
mod socket;
mod state;

pub use handler::{health_check, stats, ws_handler, StatsResponse};
pub use socket::{WsSink, WsSource};
pub use state::GatewayState;

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionRegistry;
use axum::{routing::get, Router};
use relay_common::{AppConfig, AppError, AppResult, ServerConfig};
use relay_upstream::{ChatSource, ReconnectPolicy, TwitchConnector, UpstreamListener};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Background tasks feeding the registry
#[derive(Debug)]
pub struct RelayTasks {
    pub listener: JoinHandle<()>,
    pub dispatcher: JoinHandle<()>,
}

/// Start the upstream listener and the dispatcher
///
/// Both stop when `shutdown` is cancelled.
pub fn spawn_relay(
    registry: Arc<ConnectionRegistry>,
    config: &AppConfig,
    source: Arc<dyn ChatSource>,
    shutdown: &CancellationToken,
) -> RelayTasks {
    let (publisher, events) = mpsc::channel(config.relay.event_buffer.max(1));

    let listener = UpstreamListener::new(
        source,
        config.upstream.channels.clone(),
        ReconnectPolicy::from(&config.upstream),
        publisher,
    )
    .spawn(shutdown.clone());

    let dispatcher = EventDispatcher::new(registry, events).spawn(shutdown.clone());

    RelayTasks {
        listener,
        dispatcher,
    }
}

/// Bind the subscriber listener
pub async fn bind(config: &ServerConfig) -> AppResult<TcpListener> {
    let addr = config.address();
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| AppError::Bind { addr, source })
}

/// Serve subscribers from `source` until `shutdown` is cancelled
pub async fn serve(
    config: AppConfig,
    listener: TcpListener,
    source: Arc<dyn ChatSource>,
    shutdown: CancellationToken,
) -> AppResult<()> {
    let registry = ConnectionRegistry::new_shared();
    let relay = spawn_relay(registry.clone(), &config, source, &shutdown);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Relay listening on ws://{}/ws", addr);
    }

    let app = create_app(GatewayState::new(registry.clone(), config));
    let stop = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
        .map_err(|e| AppError::Server(e.to_string()));

    // The server may also stop on its own; make sure everything else follows.
    shutdown.cancel();
    for connection in registry.snapshot() {
        connection.cancel();
    }

    if let Err(e) = relay.listener.await {
        tracing::error!(error = %e, "Upstream listener task failed");
    }
    if let Err(e) = relay.dispatcher.await {
        tracing::error!(error = %e, "Dispatcher task failed");
    }

    served
}

/// Run the relay with configuration until Ctrl-C
pub async fn run(config: AppConfig) -> AppResult<()> {
    let listener = bind(&config.server).await?;
    let source = Arc::new(TwitchConnector::new(config.upstream.url.clone()));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
        signal.cancel();
    });

    serve(config, listener, source, shutdown).await
}
