use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handlers::ApiError;
use crate::state::ApiState;

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Object counts
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub users: i64,
}

/// API status endpoint
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
    })
}

/// Number of stored objects
pub async fn stats(State(state): State<Arc<ApiState>>) -> Result<Json<StatsResponse>, ApiError> {
    let users = state
        .user_store
        .count_users()
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(StatsResponse { users }))
}

/// Always answers 401
pub async fn unauthorized() -> ApiError {
    ApiError::unauthorized()
}

/// Always answers 403
pub async fn forbidden() -> ApiError {
    ApiError::forbidden()
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
