//! Static client page handler.

use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /` — Serve the static client page.
///
/// The page itself (UI, media capture, call setup) is an external
/// collaborator; the relay only hands it to the browser. The path is
/// configured via `CLIENT_PAGE_PATH`.
///
/// # Errors
///
/// Returns [`RelayError::ClientPageNotFound`] if the configured page
/// cannot be read from disk.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Client page",
    description = "Serves the static client page used to place calls.",
    responses(
        (status = 200, description = "Static client page"),
        (status = 404, description = "Client page missing", body = ErrorResponse),
    )
)]
pub async fn client_page_handler(
    State(state): State<AppState>,
) -> Result<Html<String>, RelayError> {
    let path = &state.config.client_page_path;
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Html(contents)),
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "client page not readable");
            Err(RelayError::ClientPageNotFound(path.display().to_string()))
        }
    }
}

/// Root route for the client page.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(client_page_handler))
}
