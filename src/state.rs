use std::sync::Arc;

use crate::auth::{Auth, AuthPolicy, AuthState, BasicAuth, SessionAuth, SessionManager};
use crate::config::{AuthType, ServerConfig};
use crate::storage::UserStore;

/// State shared by the `/api/v1` handlers
pub struct ApiState {
    pub config: ServerConfig,
    pub user_store: Arc<dyn UserStore>,
    /// Gate installed in front of the API, absent when authentication is disabled
    pub auth_state: Option<Arc<AuthState>>,
    /// Session strategy, present only for `session_auth`
    pub session_auth: Option<Arc<SessionAuth>>,
}

impl ApiState {
    /// Build the state with the strategy selected by `config.auth_type`.
    ///
    /// `sessions` backs the session strategy and is ignored by the others.
    pub fn new(config: ServerConfig, user_store: Arc<dyn UserStore>, sessions: SessionManager) -> Self {
        let cookie_name = config.session_name.clone();

        let mut session_auth = None;
        let policy: Option<Arc<dyn AuthPolicy>> = match config.auth_type {
            AuthType::Disabled => None,
            AuthType::Auth => Some(Arc::new(Auth::new(cookie_name)) as Arc<dyn AuthPolicy>),
            AuthType::Basic => {
                Some(Arc::new(BasicAuth::new(user_store.clone(), cookie_name)) as Arc<dyn AuthPolicy>)
            }
            AuthType::Session => {
                let session = Arc::new(SessionAuth::new(sessions, user_store.clone(), cookie_name));
                session_auth = Some(session.clone());
                Some(session as Arc<dyn AuthPolicy>)
            }
        };

        let auth_state =
            policy.map(|policy| Arc::new(AuthState::new(policy, config.excluded_paths.clone())));

        Self {
            config,
            user_store,
            auth_state,
            session_auth,
        }
    }
}
