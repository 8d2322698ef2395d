use axum::{extract::State, http::HeaderMap, Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{verify_password, AuthPolicy, SessionAuth};
use crate::handlers::{ApiError, UserResponse};
use crate::storage::UserLookup;

/// Login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Session login endpoint
pub async fn session_login(
    State(auth): State<Arc<SessionAuth>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let email = form
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("email missing".to_string()))?;
    let password = form
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password missing".to_string()))?;

    let users = auth
        .users()
        .find_users_by(&UserLookup::Email(email.clone()))
        .await
        .map_err(ApiError::internal)?;

    let Some(user) = users.into_iter().next() else {
        warn!("Login attempt for unknown user: {}", email);
        return Err(ApiError::NotFound("no user found for this email".to_string()));
    };

    if !verify_password(&password, &user.hashed_password) {
        warn!("Invalid password for user: {}", email);
        return Err(ApiError::Unauthorized("wrong password".to_string()));
    }

    let session_id = auth.create_session(user.id);
    info!("User {} logged in", user.email);

    let cookie = Cookie::build((auth.cookie_name().to_string(), session_id))
        .path("/")
        .http_only(true);

    Ok((jar.add(cookie), Json(UserResponse::from(&user))))
}

/// Session logout endpoint
pub async fn session_logout(
    State(auth): State<Arc<SessionAuth>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    if !auth.destroy_session(&headers) {
        return Err(ApiError::not_found());
    }

    Ok(Json(json!({})))
}
