// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication and role gating.

use crate::error::AppError;
use crate::services::AuthMember;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Middleware that requires a valid session token.
///
/// On success the resolved [`AuthMember`] is stored in the request
/// extensions for handlers and [`require_admin`].
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::Unauthenticated)?;
    let auth_member = state.auth.authenticate(token)?;

    request.extensions_mut().insert(auth_member);
    Ok(next.run(request).await)
}

/// Middleware that additionally requires the admin role.
///
/// Must run after [`require_auth`]. The role checked is the one embedded in
/// the token at login, not the stored one: a demoted admin keeps access
/// until their token expires (`SESSION_TTL_DAYS`).
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let auth_member = request
        .extensions()
        .get::<AuthMember>()
        .copied()
        .ok_or(AppError::Unauthenticated)?;

    if !auth_member.is_admin() {
        tracing::warn!(member_id = %auth_member.member_id, "Member attempted admin route");
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
