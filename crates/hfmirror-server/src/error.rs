//! HTTP error mapping: turns an [`EngineError`] into a JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hfmirror_core::EngineError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the HTTP layer itself, plus any engine error wrapped
/// through for a uniform response shape.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Forwarded from the engine; status code comes from
    /// [`EngineError::status_code`].
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The request body or path did not name a known job.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// The request body failed to parse into a valid domain request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Engine(err) => (
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.to_string(),
            ),
            Self::JobNotFound(id) => (StatusCode::NOT_FOUND, format!("job not found: {id}")),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}
