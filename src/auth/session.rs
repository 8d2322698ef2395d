use async_trait::async_trait;
use axum::http::HeaderMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::policy::AuthPolicy;
use crate::storage::{User, UserLookup, UserStore};

/// Generate an opaque session identifier (random UUID v4, 122 bits of entropy)
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-memory map from session id to user id.
///
/// A user can hold any number of sessions at once; each is destroyed on its own.
/// Sessions never expire.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for `user_id` and return its id
    pub fn create_session(&self, user_id: Uuid) -> String {
        let session_id = generate_session_id();
        self.sessions.write().insert(session_id.clone(), user_id);
        session_id
    }

    /// User owning a session
    pub fn user_id(&self, session_id: &str) -> Option<Uuid> {
        self.sessions.read().get(session_id).copied()
    }

    /// Revoke a session; false when it did not exist
    pub fn revoke_session(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    /// Drop every session
    pub fn clear(&self) -> usize {
        let mut sessions = self.sessions.write();
        let count = sessions.len();
        sessions.clear();
        count
    }

    /// Get session count
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Cookie based session authentication
pub struct SessionAuth {
    sessions: SessionManager,
    users: Arc<dyn UserStore>,
    cookie_name: String,
}

impl SessionAuth {
    pub fn new(
        sessions: SessionManager,
        users: Arc<dyn UserStore>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            users,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Open a new session for `user_id`; earlier sessions stay valid
    pub fn create_session(&self, user_id: Uuid) -> String {
        self.sessions.create_session(user_id)
    }

    pub fn user_id_for_session_id(&self, session_id: &str) -> Option<Uuid> {
        self.sessions.user_id(session_id)
    }

    /// Destroy the session named by the request's cookie.
    ///
    /// Returns false when there is no cookie or it names no live session.
    pub fn destroy_session(&self, headers: &HeaderMap) -> bool {
        let Some(session_id) = self.extract_session_cookie(headers) else {
            return false;
        };
        if session_id.is_empty() || self.user_id_for_session_id(&session_id).is_none() {
            return false;
        }

        let destroyed = self.sessions.revoke_session(&session_id);
        if destroyed {
            info!("Session destroyed");
        }
        destroyed
    }
}

#[async_trait]
impl AuthPolicy for SessionAuth {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    async fn resolve_user(&self, headers: &HeaderMap) -> Option<User> {
        let session_id = self.extract_session_cookie(headers)?;
        let user_id = self.user_id_for_session_id(&session_id)?;

        match self.users.find_user_by(&UserLookup::Id(user_id)).await {
            Ok(user) => user,
            Err(e) => {
                warn!("User lookup failed for session of {}: {}", user_id, e);
                None
            }
        }
    }
}
