// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity log routes. Every route acts on the caller's own logs.

use crate::error::Result;
use crate::models::ActivityLogResponse;
use crate::routes::extract::ValidJson;
use crate::services::{
    derive_attendance, derive_metric_series, Aggregation, AuthMember, LogRequest, Metric,
    SeriesPoint,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Activity routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activity", get(list_logs).post(upsert_log))
        .route("/activity/attendance", get(get_attendance))
        .route("/activity/series", get(get_series))
}

/// Own logs, oldest day first.
async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
) -> Result<Json<Vec<ActivityLogResponse>>> {
    let mut logs = state.activity.list(auth.member_id).await?;
    logs.sort_by(|a, b| a.date.cmp(&b.date));

    Ok(Json(logs.into_iter().map(ActivityLogResponse::from).collect()))
}

async fn upsert_log(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    ValidJson(body): ValidJson<LogRequest>,
) -> Result<Json<ActivityLogResponse>> {
    let log = state
        .activity
        .upsert(auth.member_id, body, chrono::Utc::now())
        .await?;
    Ok(Json(log.into()))
}

#[derive(Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttendanceResponse {
    pub attendance: usize,
}

async fn get_attendance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
) -> Result<Json<AttendanceResponse>> {
    let logs = state.activity.list(auth.member_id).await?;
    Ok(Json(AttendanceResponse {
        attendance: derive_attendance(&logs),
    }))
}

#[derive(Deserialize)]
struct SeriesQuery {
    #[serde(default)]
    metric: String,
    aggregation: Option<String>,
}

async fn get_series(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthMember>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<SeriesPoint>>> {
    let metric = Metric::parse(&query.metric)?;
    let aggregation = query
        .aggregation
        .as_deref()
        .map(str::parse::<Aggregation>)
        .transpose()?
        .unwrap_or_default();

    let logs = state.activity.list(auth.member_id).await?;
    Ok(Json(derive_metric_series(&logs, &metric, aggregation)))
}
