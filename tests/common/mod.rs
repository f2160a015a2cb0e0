// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use gym_pro::config::{BootstrapAdmin, Config};
use gym_pro::db::{FirestoreDb, MemoryDb};
use gym_pro::models::Role;
use gym_pro::routes::create_router;
use gym_pro::services::LoginRequest;
use gym_pro::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over a fresh in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(
        AppState::new(Config::test_default(), Arc::new(db.clone())).expect("Failed to build state"),
    );
    (create_router(state.clone()), state, db)
}

/// Send a request and decode the JSON body (Null when empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register through the API. Returns (token, member id).
#[allow(dead_code)]
pub async fn register_member(app: &axum::Router, name: &str, email: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        Method::POST,
        "/members",
        None,
        Some(serde_json::json!({
            "name": name,
            "email": email,
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = body["token"].as_str().unwrap().to_string();
    let id = body["member"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

/// Seed an admin and return (token, admin id).
#[allow(dead_code)]
pub async fn create_admin(state: &AppState, email: &str) -> (String, Uuid) {
    let admin = BootstrapAdmin {
        name: "Owner".to_string(),
        email: email.to_string(),
        password: "admin-password".to_string(),
    };
    state.auth.ensure_admin(&admin).await.unwrap();

    let session = state
        .auth
        .login(LoginRequest {
            email: admin.email,
            password: admin.password,
        })
        .await
        .unwrap();
    (session.token, session.member.id)
}

/// Create a JWT directly, bypassing login.
#[allow(dead_code)]
pub fn create_test_jwt(member_id: Uuid, role: Role, signing_key: &[u8], expires_in_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        role: Role,
        exp: i64,
        iat: i64,
    }

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: member_id.to_string(),
        role,
        exp: now + expires_in_secs,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}
