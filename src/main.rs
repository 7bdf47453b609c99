//! parley-relay server entry point.
//!
//! Starts the Axum HTTP server with the REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parley_relay::api;
use parley_relay::app_state::AppState;
use parley_relay::config::RelayConfig;
use parley_relay::domain::ClientRegistry;
use parley_relay::service::RelayService;
use parley_relay::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(RelayConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting parley-relay");

    // Build domain and service layers
    let registry = Arc::new(ClientRegistry::new());
    let relay = Arc::new(RelayService::new(registry));

    // Build application state
    let app_state = AppState {
        relay,
        config: Arc::clone(&config),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .route("/ws/{client_id}", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
