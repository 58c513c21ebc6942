// Shared helpers for the black-box API tests: a real router over fresh
// in-memory state, driven request-by-request.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

use betis::app_state::{AppState, SharedState};
use betis::auth::hash_password;
use betis::config::Config;
use betis::models::User;

pub fn test_config() -> Config {
    Config {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        jwt_secret: "integration-test-secret".into(),
        jwt_expiry_secs: 3600,
        bcrypt_cost: 4,
        state_file: None,
    }
}

pub fn test_app() -> (Router, SharedState) {
    let state = AppState::new(test_config()).shared();
    let app = betis::routes::build_router(state.clone());
    (app, state)
}

/// Registration never produces admins, so tests plant one directly in
/// the store and then log in through the API like any other user.
pub fn seed_admin(state: &SharedState, username: &str, password: &str) -> User {
    let hash = hash_password(password, 4).expect("hash");
    let mut user = User::new(
        username.to_string(),
        format!("{username}@betis.test"),
        Some(hash),
        Decimal::ZERO,
    );
    user.is_admin = true;
    state.db.insert_user(user).expect("seed admin")
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub async fn register_user(app: &Router, username: &str, password: &str, balance: Decimal) -> Uuid {
    let (status, body) = request(
        app,
        "POST",
        "/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
            "balance": balance,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
    Uuid::parse_str(body["id"].as_str().expect("id")).expect("uuid")
}

/// Log in and return (access_token, jti).
pub async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let (status, body) = request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    (
        body["access_token"].as_str().expect("token").to_string(),
        body["jti"].as_str().expect("jti").to_string(),
    )
}

/// Decimal fields travel as strings; parse and compare numerically.
pub fn dec_field(body: &Value, key: &str) -> Decimal {
    Decimal::from_str(body[key].as_str().unwrap_or_else(|| panic!("missing {key} in {body}")))
        .expect("decimal")
}
