use async_trait::async_trait;
use axum::http::HeaderMap;
use base64::Engine;
use std::sync::Arc;
use tracing::warn;

use crate::auth::password::verify_password;
use crate::auth::policy::AuthPolicy;
use crate::storage::{User, UserLookup, UserStore};

const BASIC_PREFIX: &str = "Basic ";

/// HTTP Basic authentication against the user store
pub struct BasicAuth {
    users: Arc<dyn UserStore>,
    cookie_name: String,
}

impl BasicAuth {
    pub fn new(users: Arc<dyn UserStore>, cookie_name: impl Into<String>) -> Self {
        Self {
            users,
            cookie_name: cookie_name.into(),
        }
    }

    /// Base64 part of a `Basic` authorization header
    pub fn extract_base64_authorization_header(header: &str) -> Option<&str> {
        header.strip_prefix(BASIC_PREFIX)
    }

    /// Decode the Base64 credentials; invalid Base64 or non UTF-8 content yields `None`
    pub fn decode_base64_authorization_header(encoded: &str) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Split `email:password` on the first colon.
    ///
    /// Emails cannot contain a colon, so everything after the first one is
    /// the password, colons included.
    pub fn extract_user_credentials(decoded: &str) -> Option<(String, String)> {
        decoded
            .split_once(':')
            .map(|(email, password)| (email.to_string(), password.to_string()))
    }

    /// First user with this email whose stored hash accepts the password
    pub async fn user_object_from_credentials(&self, email: &str, password: &str) -> Option<User> {
        let users = match self
            .users
            .find_users_by(&UserLookup::Email(email.to_string()))
            .await
        {
            Ok(users) => users,
            Err(e) => {
                warn!("User lookup failed during basic auth: {}", e);
                return None;
            }
        };

        users
            .into_iter()
            .find(|user| verify_password(password, &user.hashed_password))
    }
}

#[async_trait]
impl AuthPolicy for BasicAuth {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    async fn resolve_user(&self, headers: &HeaderMap) -> Option<User> {
        let header = self.extract_bearer(headers)?;
        let encoded = Self::extract_base64_authorization_header(&header)?;
        let decoded = Self::decode_base64_authorization_header(encoded)?;
        let (email, password) = Self::extract_user_credentials(&decoded)?;

        let user = self.user_object_from_credentials(&email, &password).await;
        if user.is_none() {
            warn!("Basic auth rejected for {}", email);
        }
        user
    }
}
