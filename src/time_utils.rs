// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format used for calendar-day keys ("2024-06-01").
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The current calendar day in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a strict "YYYY-MM-DD" day key.
///
/// Non-canonical spellings such as "2024-6-1" are rejected so that a day
/// has exactly one key.
pub fn parse_day_key(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, DAY_KEY_FORMAT).ok()?;
    (format_day_key(date) == raw).then_some(date)
}

/// Format a date as a day key.
pub fn format_day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}
