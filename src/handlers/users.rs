use axum::{extract::Request, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::ApiError;
use crate::storage::User;

/// Public view of a user; never carries credentials
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The authenticated user, as attached by the auth gate
pub async fn current_user(request: Request) -> Result<Json<UserResponse>, ApiError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(UserResponse::from(user)))
}
