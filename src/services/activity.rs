// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily activity logs and the figures derived from them.
//!
//! Handles:
//! 1. Upserting the one log a member keeps per calendar day
//! 2. Attendance (days with anything recorded)
//! 3. Per-metric series for charts, bucketed by day, week or month

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::activity::optional_measurement;
use crate::models::{ActivityLog, LogEntry, Task};
use crate::time_utils::{format_day_key, parse_day_key};

/// Body of `POST /activity`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    pub date: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "at most 50 tasks per day"))]
    pub tasks: Vec<Task>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "note must be at most 2000 characters"))]
    pub note: Option<String>,
    #[serde(default, deserialize_with = "optional_measurement")]
    pub body_weight: Option<f64>,
}

/// Activity log reads and writes, always scoped to the owning member.
#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<dyn Database>,
}

impl ActivityLogService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Create or replace the member's log for `request.date`.
    ///
    /// The date must be a canonical day key no earlier than the day the
    /// member registered.
    pub async fn upsert(
        &self,
        member_id: Uuid,
        request: LogRequest,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog> {
        request.validate()?;

        let date = parse_day_key(request.date.trim()).ok_or_else(|| {
            AppError::Validation(format!("'{}' is not a YYYY-MM-DD date", request.date))
        })?;

        let member = self
            .db
            .get_member(member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;

        if date < member.member_since() {
            return Err(AppError::Validation(format!(
                "Cannot log {} before membership began on {}",
                format_day_key(date),
                format_day_key(member.member_since())
            )));
        }

        if let Some(weight) = request.body_weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Validation(
                    "bodyWeight must be a non-negative number".to_string(),
                ));
            }
        }

        let entry = LogEntry {
            tasks: request.tasks,
            note: request.note.unwrap_or_default(),
            body_weight: request.body_weight,
        };
        let day_key = format_day_key(date);

        let log = self.db.upsert_log(member_id, &day_key, entry, now).await?;
        tracing::debug!(member_id = %member_id, date = %day_key, tasks = log.tasks.len(), "Activity log saved");
        Ok(log)
    }

    /// The member's logs, in no particular order.
    pub async fn list(&self, member_id: Uuid) -> Result<Vec<ActivityLog>> {
        self.db.list_logs(member_id).await
    }
}

/// Days on which the member did something: a completed task or a weigh-in.
pub fn derive_attendance(logs: &[ActivityLog]) -> usize {
    logs.iter()
        .filter(|log| log.body_weight.is_some() || log.tasks.iter().any(|t| t.completed))
        .count()
}

/// What a series tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    BodyWeight,
    /// Case-insensitive substring of a task name
    Exercise(String),
}

impl Metric {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("metric is required".to_string()));
        }
        match trimmed.to_lowercase().as_str() {
            "bodyweight" | "body_weight" => Ok(Self::BodyWeight),
            other => Ok(Self::Exercise(other.to_string())),
        }
    }

    /// The value this metric takes in one day's log, if any.
    fn value_in(&self, log: &ActivityLog) -> Option<f64> {
        match self {
            Self::BodyWeight => log.body_weight,
            Self::Exercise(needle) => log
                .tasks
                .iter()
                .find(|t| t.name.to_lowercase().contains(needle.as_str()))
                .and_then(Task::weight_value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl std::str::FromStr for Aggregation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(AppError::Validation(format!(
                "Unknown aggregation '{}'",
                other
            ))),
        }
    }
}

impl Aggregation {
    /// First day of the bucket containing `date`.
    fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => date,
            Self::Weekly => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    fn label(self, bucket: NaiveDate) -> String {
        match self {
            Self::Daily | Self::Weekly => format_day_key(bucket),
            Self::Monthly => bucket.format("%B %Y").to_string(),
        }
    }
}

/// One chart point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Chronological series of `metric`, one point per non-empty bucket.
///
/// Daily points carry the day's value as is; weekly and monthly points are
/// the mean of the days in the bucket. Buckets without data are omitted.
pub fn derive_metric_series(
    logs: &[ActivityLog],
    metric: &Metric,
    aggregation: Aggregation,
) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

    for log in logs {
        let Some(date) = parse_day_key(&log.date) else {
            tracing::warn!(member_id = %log.member_id, date = %log.date, "Skipping log with malformed date");
            continue;
        };
        let Some(value) = metric.value_in(log) else {
            continue;
        };
        let slot = buckets
            .entry(aggregation.bucket_start(date))
            .or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(bucket, (sum, count))| SeriesPoint {
            label: aggregation.label(bucket),
            value: sum / f64::from(count),
        })
        .collect()
}
