// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and login over HTTP.

use axum::http::{Method, StatusCode};
use gym_pro::db::Database;
use gym_pro::models::Role;
use serde_json::json;

mod common;
use common::{create_test_app, register_member, send};

#[tokio::test]
async fn test_register_then_login_authenticates_same_member() {
    let (app, state, _) = create_test_app();
    let (_, member_id) = register_member(&app, "Asha Rao", "asha@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/members/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token = body["token"].as_str().unwrap();
    let resolved = state.auth.authenticate(token).unwrap();
    assert_eq!(resolved.member_id, member_id);
    assert_eq!(resolved.role, Role::Member);
}

#[tokio::test]
async fn test_register_response_shape() {
    let (app, _, _) = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/members",
        None,
        Some(json!({ "name": "Ravi", "email": "Ravi@Example.com", "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let member = &body["member"];
    assert_eq!(member["email"], "ravi@example.com");
    assert_eq!(member["role"], "member");
    assert_eq!(member["status"], "inactive");
    assert!(member["subscription"].is_null());
    assert!(member.get("password_hash").is_none());
    assert!(member.get("passwordHash").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_duplicate_email_any_case_is_rejected() {
    let (app, _, db) = create_test_app();
    register_member(&app, "First", "dup@example.com").await;

    for variant in ["dup@example.com", "DUP@example.com", "  Dup@Example.COM "] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/members",
            None,
            Some(json!({ "name": "Second", "email": variant, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "variant {:?}", variant);
        assert_eq!(body["error"], "duplicate_email");
    }

    assert_eq!(db.list_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (app, _, db) = create_test_app();

    let cases = [
        json!({ "name": "Short", "email": "short@example.com", "password": "1234567" }),
        json!({ "name": "Bad Email", "email": "not-an-email", "password": "password123" }),
        json!({ "name": "", "email": "blank@example.com", "password": "password123" }),
        json!({ "email": "missing-name@example.com", "password": "password123" }),
    ];

    for body in cases {
        let (status, response) = send(&app, Method::POST, "/members", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response["error"], "validation_error");
    }

    assert!(db.list_members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _, _) = create_test_app();
    register_member(&app, "Known", "known@example.com").await;

    let (unknown_status, unknown_body) = send(
        &app,
        Method::POST,
        "/members/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/members/login",
        None,
        Some(json!({ "email": "known@example.com", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let (app, _, _) = create_test_app();
    register_member(&app, "Meera", "meera@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/members/login",
        None,
        Some(json!({ "email": "MEERA@example.com", "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_registrations_create_one_member() {
    let (app, _, db) = create_test_app();

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(
                &app,
                Method::POST,
                "/members",
                None,
                Some(json!({
                    "name": format!("Racer {}", i),
                    "email": "race@example.com",
                    "password": "password123",
                })),
            )
            .await
            .0
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(db.list_members().await.unwrap().len(), 1);
}
