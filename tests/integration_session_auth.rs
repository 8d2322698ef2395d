//! HTTP tests for the /api/v1 API with session authentication

mod common;

use authgate::api_router;
use authgate::config::AuthType;
use axum::http::{Method, StatusCode};
use common::*;

const COOKIE: &str = "_my_session_id";

async fn setup() -> axum::Router {
    let store = create_test_store().await;
    create_test_user(&store, "bob@hbtn.io", "H0lbertonSchool98!").await;
    api_router(create_test_api_state(store, AuthType::Session))
}

#[tokio::test]
async fn test_status_is_public() {
    let router = setup().await;

    let (status, _, body) = send(&router, request(Method::GET, "/api/v1/status", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_routes() {
    let router = setup().await;

    let (status, _, body) =
        send(&router, request(Method::GET, "/api/v1/unauthorized", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, body) = send(&router, request(Method::GET, "/api/v1/forbidden", None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn test_gate_rejects_missing_and_bad_sessions() {
    let router = setup().await;

    let (status, _, _) = send(&router, request(Method::GET, "/api/v1/stats", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = format!("{}=not-a-session", COOKIE);
    let (status, _, _) =
        send(&router, request(Method::GET, "/api/v1/stats", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_validation() {
    let router = setup().await;
    let login = "/api/v1/auth_session/login";

    let (status, _, body) = send(&router, request(Method::POST, login, Some(""), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email missing");

    let (status, _, body) =
        send(&router, request(Method::POST, login, Some("email=bob%40hbtn.io"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "password missing");

    let (status, _, body) = send(
        &router,
        request(Method::POST, login, Some("email=ghost%40hbtn.io&password=x"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no user found for this email");

    let (status, _, body) = send(
        &router,
        request(Method::POST, login, Some("email=bob%40hbtn.io&password=wrong"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "wrong password");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let router = setup().await;

    let (status, headers, body) = send(
        &router,
        request(
            Method::POST,
            "/api/v1/auth_session/login",
            Some("email=bob%40hbtn.io&password=H0lbertonSchool98%21"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");
    assert!(body.get("hashed_password").is_none());

    let session_id = set_cookie_value(&headers, COOKIE).expect("session cookie set");
    let cookie = format!("{}={}", COOKIE, session_id);

    let (status, _, body) =
        send(&router, request(Method::GET, "/api/v1/users/me", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");

    let (status, _, body) =
        send(&router, request(Method::GET, "/api/v1/stats", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], 1);

    let (status, _, body) = send(
        &router,
        request(Method::DELETE, "/api/v1/auth_session/logout", None, Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({}));

    // The destroyed session no longer passes the gate
    let (status, _, _) = send(
        &router,
        request(Method::DELETE, "/api/v1/auth_session/logout", None, Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) =
        send(&router, request(Method::GET, "/api/v1/users/me", None, Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_with_trailing_slash() {
    let router = setup().await;

    let (status, headers, body) = send(
        &router,
        request(
            Method::POST,
            "/api/v1/auth_session/login/",
            Some("email=bob%40hbtn.io&password=H0lbertonSchool98%21"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "bob@hbtn.io");

    let cookie = format!("{}={}", COOKIE, set_cookie_value(&headers, COOKIE).unwrap());
    let (status, _, _) = send(
        &router,
        request(Method::DELETE, "/api/v1/auth_session/logout/", None, Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let router = setup().await;
    let form = "email=bob%40hbtn.io&password=H0lbertonSchool98%21";

    let (_, first, _) = send(
        &router,
        request(Method::POST, "/api/v1/auth_session/login", Some(form), None),
    )
    .await;
    let (_, second, _) = send(
        &router,
        request(Method::POST, "/api/v1/auth_session/login", Some(form), None),
    )
    .await;

    let first = format!("{}={}", COOKIE, set_cookie_value(&first, COOKIE).unwrap());
    let second = format!("{}={}", COOKIE, set_cookie_value(&second, COOKIE).unwrap());
    assert_ne!(first, second);

    let (status, _, _) = send(
        &router,
        request(Method::DELETE, "/api/v1/auth_session/logout", None, Some(&first)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) =
        send(&router, request(Method::GET, "/api/v1/users/me", None, Some(&second))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let router = setup().await;

    // Unknown routes are still behind the gate
    let (status, _, _) = send(&router, request(Method::GET, "/api/v1/nope", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
