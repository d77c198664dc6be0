//! HTTP handlers
//!
//! The subscriber upgrade endpoint plus the health and stats probes.

use super::socket::{WsSink, WsSource};
use crate::connection::open_connection;
use crate::server::GatewayState;
use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
    Json,
};
use futures_util::StreamExt;
use serde::Serialize;

/// Subscriber upgrade handler
///
/// Any origin is accepted.
pub async fn ws_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Run an upgraded subscriber until it disconnects
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let (sink, stream) = socket.split();

    let tasks = open_connection(
        state.registry(),
        Box::new(WsSink::new(sink)),
        Box::new(WsSource::new(stream)),
        state.config().relay.outbound_buffer,
    );
    let id = tasks.connection.id();

    tracing::info!(
        connection_id = %id,
        connections = state.registry().len(),
        "Subscriber connected"
    );

    match tasks.reader.await {
        Ok(reason) => tracing::info!(connection_id = %id, reason = ?reason, "Subscriber disconnected"),
        Err(e) => tracing::error!(connection_id = %id, error = %e, "Reader task failed"),
    }

    if let Err(e) = tasks.writer.await {
        tracing::error!(connection_id = %id, error = %e, "Writer task failed");
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Body of the stats endpoint
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: usize,
}

/// Report the number of live subscribers
pub async fn stats(State(state): State<GatewayState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connections: state.registry().len(),
    })
}
