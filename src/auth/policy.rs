use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use crate::storage::User;

/// Whether `path` needs an authenticated user.
///
/// The path is compared with a trailing slash appended, so `/api/v1/status`
/// matches an excluded `/api/v1/status/`. A missing path or an empty
/// exclusion list always requires authentication.
pub fn requires_auth(path: Option<&str>, excluded_paths: &[String]) -> bool {
    let Some(path) = path else {
        return true;
    };
    if excluded_paths.is_empty() {
        return true;
    }

    let normalized = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };

    !excluded_paths.iter().any(|excluded| *excluded == normalized)
}

/// Raw value of the `Authorization` header
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Value of the cookie called `cookie_name`
pub fn extract_session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
}

/// Authentication strategy shared by the API gate.
///
/// Concrete strategies only decide how a request resolves to a [`User`];
/// path exclusion and credential extraction are common to all of them.
#[async_trait]
pub trait AuthPolicy: Send + Sync {
    /// Name of the cookie that carries a session id
    fn cookie_name(&self) -> &str;

    /// Resolve the user behind the request's credentials
    async fn resolve_user(&self, headers: &HeaderMap) -> Option<User>;

    fn requires_auth(&self, path: Option<&str>, excluded_paths: &[String]) -> bool {
        requires_auth(path, excluded_paths)
    }

    fn extract_bearer(&self, headers: &HeaderMap) -> Option<String> {
        extract_bearer(headers)
    }

    fn extract_session_cookie(&self, headers: &HeaderMap) -> Option<String> {
        extract_session_cookie(headers, self.cookie_name())
    }
}

/// Base strategy: gates paths but never resolves a user
#[derive(Debug, Clone)]
pub struct Auth {
    cookie_name: String,
}

impl Auth {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl AuthPolicy for Auth {
    fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    async fn resolve_user(&self, _headers: &HeaderMap) -> Option<User> {
        None
    }
}
