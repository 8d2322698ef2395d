use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthError, AuthService};
use crate::config::SERVICE_SESSION_COOKIE;
use crate::handlers::ApiError;

/// Email and password form
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Reset token request form
#[derive(Debug, Deserialize)]
pub struct ResetRequestForm {
    pub email: Option<String>,
}

/// Password update form
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordForm {
    pub email: Option<String>,
    pub new_password: Option<String>,
    pub reset_token: Option<String>,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
}

/// Profile response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
}

/// Reset token response
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetTokenResponse {
    pub email: String,
    pub reset_token: String,
}

/// Welcome endpoint
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        email: None,
        message: "Bienvenue".to_string(),
    })
}

/// Registration endpoint.
///
/// An already registered email is reported with 200 and a message, not an error status.
pub async fn register(
    State(auth): State<Arc<AuthService>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (Some(email), Some(password)) = (form.email, form.password) else {
        return Err(ApiError::BadRequest("email and password are required".to_string()));
    };

    match auth.register_user(&email, &password).await {
        Ok(_) => Ok(Json(MessageResponse {
            email: Some(email),
            message: "user created".to_string(),
        })),
        Err(AuthError::UserAlreadyExists(_)) => Ok(Json(MessageResponse {
            email: None,
            message: "email already registered".to_string(),
        })),
        Err(e) => Err(ApiError::internal(e)),
    }
}

/// Login endpoint
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let (Some(email), Some(password)) = (form.email, form.password) else {
        return Err(ApiError::unauthorized());
    };

    if !auth.valid_login(&email, &password).await {
        warn!("Invalid login for {}", email);
        return Err(ApiError::unauthorized());
    }

    let session_id = auth
        .create_session(&email)
        .await
        .ok_or_else(ApiError::unauthorized)?;
    info!("User {} logged in", email);

    let cookie = Cookie::build((SERVICE_SESSION_COOKIE, session_id)).path("/");

    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            email: Some(email),
            message: "logged in".to_string(),
        }),
    ))
}

/// Logout endpoint; redirects home
pub async fn logout(
    State(auth): State<Arc<AuthService>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let session_id = jar.get(SERVICE_SESSION_COOKIE).map(|c| c.value());
    let user = auth
        .get_user_from_session_id(session_id)
        .await
        .ok_or_else(ApiError::forbidden)?;

    auth.destroy_session(user.id).await;
    info!("User {} logged out", user.email);

    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]).into_response())
}

/// Profile of the logged in user
pub async fn profile(
    State(auth): State<Arc<AuthService>>,
    jar: CookieJar,
) -> Result<Json<ProfileResponse>, ApiError> {
    let session_id = jar.get(SERVICE_SESSION_COOKIE).map(|c| c.value());
    let user = auth
        .get_user_from_session_id(session_id)
        .await
        .ok_or_else(ApiError::forbidden)?;

    Ok(Json(ProfileResponse { email: user.email }))
}

/// Issue a password reset token
pub async fn get_reset_password_token(
    State(auth): State<Arc<AuthService>>,
    Form(form): Form<ResetRequestForm>,
) -> Result<Json<ResetTokenResponse>, ApiError> {
    let email = form.email.ok_or_else(ApiError::forbidden)?;

    let reset_token = auth
        .get_reset_password_token(&email)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound(_) => {
                warn!("Reset token requested for unknown email {}", email);
                ApiError::forbidden()
            }
            other => ApiError::internal(other),
        })?;

    Ok(Json(ResetTokenResponse { email, reset_token }))
}

/// Set a new password with a reset token
pub async fn update_password(
    State(auth): State<Arc<AuthService>>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let reset_token = form.reset_token.ok_or_else(ApiError::forbidden)?;
    let new_password = form
        .new_password
        .ok_or_else(|| ApiError::BadRequest("new_password missing".to_string()))?;

    auth.update_password(&reset_token, &new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidResetToken => {
                warn!("Password update with an invalid reset token");
                ApiError::forbidden()
            }
            other => ApiError::internal(other),
        })?;

    Ok(Json(MessageResponse {
        email: form.email,
        message: "Password updated".to_string(),
    }))
}
