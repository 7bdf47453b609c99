//! REST API layer: route handlers and router composition.
//!
//! All endpoints are mounted at the root level to match the wire
//! surface the browser client expects.

pub mod handlers;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::app_state::AppState;

/// Builds the REST router: client page, health, and id generation.
///
/// The request timeout is applied to these routes only; the WebSocket
/// route is mounted separately and never carries one.
pub fn build_router(request_timeout: Duration) -> Router<AppState> {
    Router::new()
        .merge(handlers::page::routes())
        .merge(handlers::system::routes())
        .layer(TimeoutLayer::new(request_timeout))
}
