use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum BeesyncError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request already in flight: {0}")]
    InFlight(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BeesyncError {
    /// Status code shown to the browser when this error reaches a JSON endpoint.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BeesyncError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BeesyncError::NotFound(_) => StatusCode::NOT_FOUND,
            BeesyncError::InFlight(_) => StatusCode::CONFLICT,
            BeesyncError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BeesyncError::Http(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            BeesyncError::Http(_) | BeesyncError::Status { .. } => StatusCode::BAD_GATEWAY,
            BeesyncError::Serialization(_) => StatusCode::BAD_GATEWAY,
            BeesyncError::Config(_) | BeesyncError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, BeesyncError>;

/// Error type for the JSON API endpoints of the web server.
#[derive(Debug)]
pub struct ApiError(pub BeesyncError);

impl<E> From<E> for ApiError
where
    E: Into<BeesyncError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        tracing::warn!(%status, error = %self.0, "API request failed");
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
