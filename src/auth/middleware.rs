use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::auth::policy::AuthPolicy;
use crate::handlers::ApiError;

/// Authentication state shared with middleware
#[derive(Clone)]
pub struct AuthState {
    pub policy: Arc<dyn AuthPolicy>,
    pub excluded_paths: Vec<String>,
}

impl AuthState {
    pub fn new(policy: Arc<dyn AuthPolicy>, excluded_paths: Vec<String>) -> Self {
        Self {
            policy,
            excluded_paths,
        }
    }
}

/// Gate for API routes.
///
/// Requests without any credentials get 401, credentials that resolve to no
/// user get 403. On success the resolved user is stored in the request
/// extensions for handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let policy = &state.policy;

    if !policy.requires_auth(Some(request.uri().path()), &state.excluded_paths) {
        return next.run(request).await;
    }

    let headers = request.headers();
    if policy.extract_bearer(headers).is_none() && policy.extract_session_cookie(headers).is_none() {
        return ApiError::unauthorized().into_response();
    }

    let Some(user) = policy.resolve_user(headers).await else {
        warn!("Rejected credentials for {}", request.uri().path());
        return ApiError::forbidden().into_response();
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
