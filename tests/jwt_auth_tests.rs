// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session token tests.
//!
//! These tests verify that tokens issued at login decode with the claim
//! layout the middleware expects, catching compatibility issues early.

use chrono::{Duration, Utc};
use gym_pro::models::Role;
use gym_pro::services::auth::Claims;
use gym_pro::services::TokenService;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use uuid::Uuid;

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

#[test]
fn test_jwt_roundtrip() {
    let tokens = TokenService::new(SIGNING_KEY, 30);
    let member_id = Uuid::new_v4();

    let token = tokens.issue(member_id, Role::Member, Utc::now()).unwrap();

    // Decode with plain jsonwebtoken, as any other verifier would
    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, member_id.to_string());
    assert_eq!(token_data.claims.role, Role::Member);
    assert!(token_data.claims.exp > token_data.claims.iat);
}

#[test]
fn test_verify_resolves_member_and_role() {
    let tokens = TokenService::new(SIGNING_KEY, 30);
    let member_id = Uuid::new_v4();

    let token = tokens.issue(member_id, Role::Admin, Utc::now()).unwrap();
    let resolved = tokens.verify(&token).unwrap();

    assert_eq!(resolved.member_id, member_id);
    assert!(resolved.is_admin());
}

#[test]
fn test_jwt_expiration_follows_ttl() {
    let tokens = TokenService::new(SIGNING_KEY, 30);
    let now = Utc::now();
    let token = tokens.issue(Uuid::new_v4(), Role::Member, now).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let token_data = decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256)).unwrap();

    assert_eq!(
        token_data.claims.exp,
        (now + Duration::days(30)).timestamp()
    );
    assert_eq!(token_data.claims.iat, now.timestamp());
}

#[test]
fn test_token_issued_long_ago_is_rejected() {
    let tokens = TokenService::new(SIGNING_KEY, 1);
    let token = tokens
        .issue(Uuid::new_v4(), Role::Member, Utc::now() - Duration::days(2))
        .unwrap();

    assert!(tokens.verify(&token).is_err());
}

#[test]
fn test_tampered_token_is_rejected() {
    let tokens = TokenService::new(SIGNING_KEY, 30);
    let token = tokens.issue(Uuid::new_v4(), Role::Member, Utc::now()).unwrap();

    let other = TokenService::new(b"another_signing_key_32_bytes!!!!", 30);
    assert!(other.verify(&token).is_err());

    let mut tampered = token.clone();
    tampered.pop();
    assert!(tokens.verify(&tampered).is_err());
}
