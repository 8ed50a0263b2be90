//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use parkwise_api::auth::jwt::JwtConfig;
use parkwise_api::auth::password::hash_password;
use parkwise_api::config::{BootstrapConfig, LogFormat, ServerConfig};
use parkwise_api::router::build_app_router;
use parkwise_api::state::AppState;
use parkwise_core::roles::UserRole;
use parkwise_db::models::lot::{CreateLot, Lot};
use parkwise_db::models::user::{CreateUser, User};
use parkwise_db::repositories::{LotRepo, UserRepo};
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "test_password_123";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        transaction_timeout_secs: 5,
        db_max_connections: 5,
        min_password_length: 8,
        static_dir: None,
        log_format: LogFormat::Text,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        bootstrap: BootstrapConfig::default(),
    }
}

/// Build the full application router, with the production middleware
/// stack, on top of the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send_json_auth(app, Method::POST, uri, body, token).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send_json_auth(app, Method::PUT, uri, body, token).await
}

async fn send_json_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly into the database.
pub async fn create_user(pool: &PgPool, username: &str, role: UserRole) -> User {
    let input = CreateUser {
        username: username.to_string(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

pub async fn create_lot(pool: &PgPool, name: &str, capacity: i32, fee_rate: f64) -> Lot {
    let input = CreateLot {
        name: name.to_string(),
        location: format!("{name} Avenue"),
        description: String::new(),
        capacity,
        fee_rate,
    };
    LotRepo::create(pool, &input).await.unwrap()
}

/// Log in through the API and return the access token.
pub async fn login(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
