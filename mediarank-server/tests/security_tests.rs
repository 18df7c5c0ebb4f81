//! Identity hash checks with a non-zero shared secret
//!
//! The router is built with hash checking enabled; requests must carry a
//! fresh `x-auth-timestamp` and the matching `x-auth-hash`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mediarank_common::api::auth::calculate_hash;
use mediarank_common::db::open_in_memory;
use mediarank_server::search::SearchService;
use mediarank_server::{build_router, AppState};
use tower::util::ServiceExt;

const SECRET: i64 = 12345;

async fn setup_app_with_auth() -> Router {
    let pool = open_in_memory().await.expect("in-memory database");
    build_router(AppState::new(pool, SECRET, SearchService::default()))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn signed_request(user: &str, timestamp: i64, hash: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/api/stats")
        .header("x-user-id", user)
        .header("x-auth-timestamp", timestamp.to_string())
        .header("x-auth-hash", hash)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_valid_hash_accepted() {
    let app = setup_app_with_auth().await;
    let ts = now_ms();
    let hash = calculate_hash("alice", ts, SECRET);

    let response = app.oneshot(signed_request("alice", ts, &hash)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_hash_for_other_user_rejected() {
    let app = setup_app_with_auth().await;
    let ts = now_ms();
    let hash = calculate_hash("bob", ts, SECRET);

    let response = app.oneshot(signed_request("alice", ts, &hash)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_hash_with_wrong_secret_rejected() {
    let app = setup_app_with_auth().await;
    let ts = now_ms();
    let hash = calculate_hash("alice", ts, SECRET + 1);

    let response = app.oneshot(signed_request("alice", ts, &hash)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let app = setup_app_with_auth().await;
    let ts = now_ms() - 5 * 60 * 1000;
    let hash = calculate_hash("alice", ts, SECRET);

    let response = app.oneshot(signed_request("alice", ts, &hash)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_future_timestamp_rejected() {
    let app = setup_app_with_auth().await;
    let ts = now_ms() + 60 * 1000;
    let hash = calculate_hash("alice", ts, SECRET);

    let response = app.oneshot(signed_request("alice", ts, &hash)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_auth_headers_rejected() {
    let app = setup_app_with_auth().await;

    let user_only = Request::builder()
        .uri("/api/stats")
        .header("x-user-id", "alice")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(user_only).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let ts = now_ms();
    let no_hash = Request::builder()
        .uri("/api/stats")
        .header("x-user-id", "alice")
        .header("x-auth-timestamp", ts.to_string())
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(no_hash).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_open_with_auth_enabled() {
    let app = setup_app_with_auth().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
