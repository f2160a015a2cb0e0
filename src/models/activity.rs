// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily activity log model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// One exercise entry within a day's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Task {
    /// Exercise name (e.g. "Bench Press")
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    /// Free-form, e.g. "3x10"
    #[serde(default, deserialize_with = "text_or_number")]
    pub reps: Option<String>,
    /// Free-form, e.g. "60kg"
    #[serde(default, deserialize_with = "text_or_number")]
    pub weight: Option<String>,
}

impl Task {
    /// Numeric value of the weight used, taken from its leading number.
    ///
    /// "62.5kg" -> 62.5, "  80 " -> 80, "heavy" -> None.
    pub fn weight_value(&self) -> Option<f64> {
        leading_number(self.weight.as_deref()?)
    }
}

/// Stored activity log, one per (member, day).
///
/// Document ID is `{member_id}_{date}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    /// Owning member
    pub member_id: Uuid,
    /// Calendar day key ("YYYY-MM-DD")
    pub date: String,
    /// `None` means not recorded, which is distinct from zero
    #[serde(default)]
    pub body_weight: Option<f64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The member-editable part of a log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntry {
    pub tasks: Vec<Task>,
    pub note: String,
    pub body_weight: Option<f64>,
}

impl ActivityLog {
    pub fn new(member_id: Uuid, date: String, entry: LogEntry, now: DateTime<Utc>) -> Self {
        Self {
            member_id,
            date,
            body_weight: entry.body_weight,
            tasks: entry.tasks,
            note: entry.note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields in place. Tasks are replaced wholesale.
    pub fn apply(&mut self, entry: LogEntry, now: DateTime<Utc>) {
        self.tasks = entry.tasks;
        self.note = entry.note;
        self.body_weight = entry.body_weight;
        self.updated_at = now;
    }

    /// Firestore document ID for a (member, day) pair.
    pub fn document_id(member_id: Uuid, date: &str) -> String {
        format!("{}_{}", member_id, date)
    }
}

/// Activity log as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogResponse {
    pub date: String,
    pub body_weight: Option<f64>,
    pub tasks: Vec<Task>,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ActivityLog> for ActivityLogResponse {
    fn from(log: ActivityLog) -> Self {
        Self {
            date: log.date,
            body_weight: log.body_weight,
            tasks: log.tasks,
            note: log.note,
            created_at: crate::time_utils::format_utc_rfc3339(log.created_at),
            updated_at: crate::time_utils::format_utc_rfc3339(log.updated_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(f64),
}

/// Accept `"60kg"`, `60`, `""` or `null`; blank text becomes `None`.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<TextOrNumber>::deserialize(deserializer)? {
            Some(TextOrNumber::Text(s)) if !s.trim().is_empty() => Some(s),
            Some(TextOrNumber::Number(n)) => Some(n.to_string()),
            _ => None,
        },
    )
}

/// Body weight as sent by clients: a number, a numeric string, `""` or `null`.
///
/// Absent and empty both mean "unset". Non-numeric text is an error.
pub fn optional_measurement<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TextOrNumber::Number(n)) => Ok(Some(n)),
        Some(TextOrNumber::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(TextOrNumber::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid measurement '{}'", s))),
    }
}

/// Like [`optional_measurement`], but keeps "absent" apart from "cleared".
///
/// Use with `#[serde(default)]`: a missing field stays `None`, while
/// `null` or `""` becomes `Some(None)`.
pub fn measurement_update<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_measurement(deserializer).map(Some)
}

fn leading_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<f64>().ok()
}
