use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::config::ServerConfig;
use crate::handlers::{
    current_user, forbidden, get_reset_password_token, index, login, logout, not_found, profile,
    register, session_login, session_logout, stats, status, unauthorized, update_password,
};
use crate::state::ApiState;

/// Router for the `/api/v1` API.
///
/// Session routes exist only when the session strategy is configured, and the
/// auth gate wraps every route when any strategy is. A trailing slash on the
/// request path is ignored.
pub fn api_router(state: Arc<ApiState>) -> Router {
    let mut api = Router::new()
        .route("/status", get(status))
        .route("/stats", get(stats))
        .route("/unauthorized", get(unauthorized))
        .route("/forbidden", get(forbidden))
        .route("/users/me", get(current_user));

    if let Some(session_auth) = &state.session_auth {
        let session_routes = Router::new()
            .route("/auth_session/login", post(session_login))
            .route("/auth_session/logout", delete(session_logout))
            .with_state(session_auth.clone());
        api = api.merge(session_routes);
    }

    let mut router = Router::new().nest("/api/v1", api).fallback(not_found);

    if let Some(auth_state) = &state.auth_state {
        router = router.layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));
    }

    let router = router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state);

    trim_trailing_slash(router)
}

/// Router for the user authentication service; a trailing slash on the request path is ignored
pub fn service_router(auth: Arc<AuthService>, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/users", post(register))
        .route("/sessions", post(login).delete(logout))
        .route("/profile", get(profile))
        .route(
            "/reset_password",
            post(get_reset_password_token).put(update_password),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(auth);

    trim_trailing_slash(router)
}

/// Strip a trailing slash before `router` matches the path.
///
/// Layers added with `Router::layer` run after routing, so the normalising
/// service sits outside the router as its only fallback.
fn trim_trailing_slash(router: Router) -> Router {
    Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(router))
}

/// CORS configuration; `*` allows any origin without credentials
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.iter().any(|origin| origin == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    cors.allow_origin(origins).allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{connect_pool, SqliteUserStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:3000";

    async fn router_with_origins(origins: &[&str]) -> Router {
        let pool = connect_pool("sqlite::memory:").await.unwrap();
        let store = SqliteUserStore::new(pool);
        store.initialize().await.unwrap();

        let config = ServerConfig {
            cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        };
        service_router(Arc::new(AuthService::new(Arc::new(store))), &config)
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/sessions")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_for_configured_origin() {
        let router = router_with_origins(&[ORIGIN]).await;

        let response = router.oneshot(preflight(ORIGIN)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_preflight_for_other_origin() {
        let router = router_with_origins(&[ORIGIN]).await;

        let response = router.oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_preflight_for_any_origin() {
        let router = router_with_origins(&["*"]).await;

        let response = router.oneshot(preflight(ORIGIN)).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }
}
