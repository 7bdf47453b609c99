//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Routing
//! errors are logged and swallowed at the connection loop (the wire
//! protocol is fire-and-forget and defines no error message type), while
//! REST-facing variants map to a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ClientId;

/// Structured JSON error response body.
///
/// All REST error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "client page not found: client.html",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Payload         | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Inbound frame was not valid JSON.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// Inbound frame matched no recognized message shape.
    #[error("unrecognized message shape")]
    UnrecognizedMessage,

    /// Routed message named a client that is not connected.
    #[error("unknown target: {0}")]
    UnknownTarget(ClientId),

    /// A send to the client's channel failed; the peer is gone.
    #[error("channel closed for client {0}")]
    ChannelClosed(ClientId),

    /// The static client page is missing from disk.
    #[error("client page not found: {0}")]
    ClientPageNotFound(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedMessage(_) => 1001,
            Self::UnrecognizedMessage => 1002,
            Self::UnknownTarget(_) => 2001,
            Self::ClientPageNotFound(_) => 2002,
            Self::ChannelClosed(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedMessage(_) | Self::UnrecognizedMessage => StatusCode::BAD_REQUEST,
            Self::UnknownTarget(_) | Self::ClientPageNotFound(_) => StatusCode::NOT_FOUND,
            Self::ChannelClosed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
