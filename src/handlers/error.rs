use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by route handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    BadRequest(String),
    /// Missing or bad credentials
    #[error("{0}")]
    Unauthorized(String),
    /// Known identity, request refused
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Forbidden".to_string())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not found".to_string())
    }

    pub fn internal(cause: impl std::fmt::Display) -> Self {
        Self::Internal(cause.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(cause) => {
                error!("Request failed: {}", cause);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}
