//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use authgate::auth::{hash_password, SessionManager};
use authgate::config::{AuthType, ServerConfig};
use authgate::state::ApiState;
use authgate::storage::{connect_pool, SqliteUserStore, User, UserStore};
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Create an in-memory user store for testing
pub async fn create_test_store() -> Arc<SqliteUserStore> {
    let pool = connect_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    let store = SqliteUserStore::new(pool);
    store.initialize().await.expect("Failed to initialize schema");
    Arc::new(store)
}

/// Insert a user with a hashed password
pub async fn create_test_user(store: &SqliteUserStore, email: &str, password: &str) -> User {
    store
        .add_user(email, &hash_password(password).unwrap())
        .await
        .expect("Failed to create test user")
}

/// API state using the given strategy and the default excluded paths
pub fn create_test_api_state(store: Arc<SqliteUserStore>, auth_type: AuthType) -> Arc<ApiState> {
    let config = ServerConfig {
        auth_type,
        ..Default::default()
    };
    Arc::new(ApiState::new(config, store, SessionManager::new()))
}

/// Build a request with optional form body and cookie
pub fn request(method: Method, uri: &str, form: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and collect status, headers and JSON body
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::json!({}));

    (status, headers, json)
}

/// Value of the cookie `name` set by a response
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}
