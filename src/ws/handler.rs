//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::ClientId;

/// `GET /ws/{client_id}` — Upgrade HTTP connection to WebSocket.
///
/// The path segment is the client-supplied identifier: opaque, not
/// validated for format or uniqueness. Two connections claiming the
/// same identifier are both accepted; the later registration supersedes
/// the earlier one.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let relay = Arc::clone(&state.relay);
    let client_id = ClientId::from(client_id);
    tracing::debug!(client = %client_id, "ws upgrade requested");

    ws.on_upgrade(move |socket| run_connection(socket, client_id, relay))
}
