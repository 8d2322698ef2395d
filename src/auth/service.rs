use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::auth::session::generate_session_id;
use crate::storage::{StorageError, User, UserLookup, UserStore, UserUpdate};

/// Errors surfaced by the authentication service
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User {0} already exists")]
    UserAlreadyExists(String),
    #[error("No user registered for {0}")]
    UserNotFound(String),
    #[error("Invalid reset token")]
    InvalidResetToken,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Registration, login and password reset backed by the users table.
///
/// The session id lives on the user row, so each user has at most one
/// active session and a new login replaces the previous one.
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new user, failing if the email is already taken
    pub async fn register_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let existing = self
            .users
            .find_user_by(&UserLookup::Email(email.to_string()))
            .await?;
        if existing.is_some() {
            return Err(AuthError::UserAlreadyExists(email.to_string()));
        }

        let hashed_password = hash_password(password)?;
        let user = self
            .users
            .add_user(email, &hashed_password)
            .await
            .map_err(|e| match e {
                StorageError::DuplicateEmail(email) => AuthError::UserAlreadyExists(email),
                other => AuthError::Storage(other),
            })?;

        info!("Registered user {}", user.email);
        Ok(user)
    }

    /// Whether the credentials match a registered user
    pub async fn valid_login(&self, email: &str, password: &str) -> bool {
        match self.find(UserLookup::Email(email.to_string())).await {
            Some(user) => verify_password(password, &user.hashed_password),
            None => false,
        }
    }

    /// Start a session for the user, replacing any previous one
    pub async fn create_session(&self, email: &str) -> Option<String> {
        let user = self.find(UserLookup::Email(email.to_string())).await?;
        let session_id = generate_session_id();

        if let Err(e) = self
            .users
            .update_user(user.id, &[UserUpdate::SessionId(Some(session_id.clone()))])
            .await
        {
            warn!("Failed to store session for {}: {}", user.email, e);
            return None;
        }

        Some(session_id)
    }

    pub async fn get_user_from_session_id(&self, session_id: Option<&str>) -> Option<User> {
        let session_id = session_id?;
        self.find(UserLookup::SessionId(session_id.to_string())).await
    }

    /// Clear the user's session; unknown users are ignored
    pub async fn destroy_session(&self, user_id: Uuid) {
        if let Err(e) = self
            .users
            .update_user(user_id, &[UserUpdate::SessionId(None)])
            .await
        {
            warn!("Failed to destroy session for {}: {}", user_id, e);
        }
    }

    /// Issue a reset token and store it on the user
    pub async fn get_reset_password_token(&self, email: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_user_by(&UserLookup::Email(email.to_string()))
            .await?
            .ok_or_else(|| AuthError::UserNotFound(email.to_string()))?;

        let reset_token = generate_session_id();
        self.users
            .update_user(user.id, &[UserUpdate::ResetToken(Some(reset_token.clone()))])
            .await?;

        Ok(reset_token)
    }

    /// Replace the password of the user holding `reset_token` and consume the token
    pub async fn update_password(&self, reset_token: &str, password: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_user_by(&UserLookup::ResetToken(reset_token.to_string()))
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let hashed_password = hash_password(password)?;
        self.users
            .update_user(
                user.id,
                &[
                    UserUpdate::HashedPassword(hashed_password),
                    UserUpdate::ResetToken(None),
                ],
            )
            .await?;

        info!("Password updated for {}", user.email);
        Ok(())
    }

    /// Look up a user, treating store failures as a miss
    async fn find(&self, lookup: UserLookup) -> Option<User> {
        match self.users.find_user_by(&lookup).await {
            Ok(user) => user,
            Err(e) => {
                warn!("User lookup by {} failed: {}", lookup, e);
                None
            }
        }
    }
}
