//! System endpoints: health check and identifier generation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::ClientId;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    connected_clients: usize,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns a static ok status, the number of currently connected clients, the service version, and the current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let connected_clients = state.relay.registry().len().await;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            connected_clients,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Freshly generated candidate identifier.
#[derive(Debug, Serialize, ToSchema)]
struct GenerateIdResponse {
    #[schema(value_type = String)]
    id: ClientId,
}

/// `GET /generate_id` — Generate a candidate client identifier.
///
/// The returned token is an 8-hex-char UUID prefix. It is neither
/// checked against the registry nor reserved; a client could still fail
/// to claim it.
#[utoipa::path(
    get,
    path = "/generate_id",
    tag = "System",
    summary = "Generate a client identifier",
    description = "Returns a freshly generated candidate identifier with no collision check and no reservation.",
    responses(
        (status = 200, description = "Candidate identifier", body = GenerateIdResponse),
    )
)]
pub async fn generate_id_handler() -> impl IntoResponse {
    let id = ClientId::generate();
    tracing::debug!(%id, "generated client id");
    (StatusCode::OK, Json(GenerateIdResponse { id }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate_id", get(generate_id_handler))
}
