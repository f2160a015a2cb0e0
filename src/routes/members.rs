// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member account routes: registration, login, profile and admin roster.

use crate::error::Result;
use crate::models::{AdminStats, MemberResponse};
use crate::routes::extract::{parse_member_id, ValidJson};
use crate::services::{
    AdminMemberUpdate, AuthMember, AuthResponse, LoginRequest, MemberFilter, MemberSort,
    ProfileUpdate, RegisterRequest,
};
use crate::time_utils::today_utc;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Routes open to anyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/members", post(register))
        .route("/members/login", post(login))
}

/// Routes for any signed-in member.
pub fn member_routes() -> Router<Arc<AppState>> {
    Router::new().route("/members/profile", get(get_profile).put(update_profile))
}

/// Routes for admins only.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/members", get(list_members))
        .route("/members/stats", get(member_stats))
        .route("/members/{id}", put(update_member).delete(delete_member))
}

// ─── Auth ────────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let response = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.auth.login(body).await?))
}

// ─── Own Profile ─────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
) -> Result<Json<MemberResponse>> {
    Ok(Json(state.membership.get(auth.member_id, today_utc()).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    ValidJson(body): ValidJson<ProfileUpdate>,
) -> Result<Json<MemberResponse>> {
    let member = state
        .membership
        .update_profile(auth.member_id, body, today_utc())
        .await?;
    Ok(Json(member))
}

// ─── Admin Roster ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct MembersQuery {
    filter: Option<String>,
    plan: Option<String>,
    days: Option<i64>,
    sort: Option<String>,
}

/// Non-admin members, optionally filtered and sorted.
async fn list_members(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<Vec<MemberResponse>>> {
    let filter = MemberFilter::from_query(query.filter.as_deref(), query.plan.as_deref(), query.days)?;
    let sort = query
        .sort
        .as_deref()
        .map(str::parse::<MemberSort>)
        .transpose()?;

    Ok(Json(state.membership.list(&filter, sort, today_utc()).await?))
}

async fn member_stats(State(state): State<Arc<AppState>>) -> Result<Json<AdminStats>> {
    Ok(Json(state.membership.stats(today_utc()).await?))
}

async fn update_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AdminMemberUpdate>,
) -> Result<Json<MemberResponse>> {
    let target = parse_member_id(&id)?;
    let member = state
        .membership
        .admin_update(auth, target, body, today_utc())
        .await?;
    Ok(Json(member))
}

/// Delete a member with all their logs. Admin targets are refused.
async fn delete_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let target = parse_member_id(&id)?;
    state.membership.delete(auth, target).await?;
    Ok(StatusCode::NO_CONTENT)
}
