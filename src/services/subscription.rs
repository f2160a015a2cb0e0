// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription lifecycle rules.
//!
//! Everything here is a pure function of its inputs and an explicit `today`,
//! so the roster views and the dashboard agree on the same day.

use chrono::{Months, NaiveDate};
use std::cmp::Ordering;

use crate::error::AppError;
use crate::models::{Member, MemberStatus};

/// Members within this many days of their end date are "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 5;

/// Whole days from `today` until `end_date`; negative once lapsed.
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// Classify a member as of `today`.
///
/// Priority order: admin, then no plan, then date math.
pub fn compute_status(member: &Member, today: NaiveDate) -> MemberStatus {
    if member.is_admin() {
        return MemberStatus::Admin;
    }

    let Some(subscription) = member
        .subscription
        .as_ref()
        .filter(|s| !s.plan.trim().is_empty())
    else {
        return MemberStatus::Inactive;
    };

    match days_remaining(subscription.end_date, today) {
        d if d < 0 => MemberStatus::Expired,
        d if d <= EXPIRING_SOON_DAYS => MemberStatus::ExpiringSoon,
        _ => MemberStatus::Active,
    }
}

/// End of a term of `months` calendar months starting at `start`.
///
/// The day of month is clamped to the end of the target month, so
/// Jan 31 + 1 month is the last day of February.
pub fn subscription_end_date(start: NaiveDate, months: i64) -> Result<NaiveDate, AppError> {
    if months <= 0 {
        return Err(AppError::Validation(
            "durationMonths must be a positive number of months".to_string(),
        ));
    }
    let months = u32::try_from(months)
        .map_err(|_| AppError::Validation(format!("durationMonths {} is too large", months)))?;

    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::Validation("Subscription end date is out of range".to_string()))
}

/// Roster selection; exactly one applies per view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MemberFilter {
    #[default]
    All,
    /// Exact plan name
    Plan(String),
    /// No plan
    Inactive,
    Expired,
    ExpiringSoon,
    /// 0..=N days remaining
    WithinDays(i64),
}

impl MemberFilter {
    /// Build from query parameters (`filter`, `plan`, `days`).
    pub fn from_query(
        filter: Option<&str>,
        plan: Option<&str>,
        days: Option<i64>,
    ) -> Result<Self, AppError> {
        match filter.unwrap_or("all") {
            "all" => Ok(Self::All),
            "plan" => plan
                .filter(|p| !p.is_empty())
                .map(|p| Self::Plan(p.to_string()))
                .ok_or_else(|| AppError::Validation("filter=plan requires a plan".to_string())),
            "inactive" => Ok(Self::Inactive),
            "expired" => Ok(Self::Expired),
            "expiring" => Ok(Self::ExpiringSoon),
            "within" => match days {
                Some(n) if n >= 0 => Ok(Self::WithinDays(n)),
                _ => Err(AppError::Validation(
                    "filter=within requires a non-negative days value".to_string(),
                )),
            },
            other => Err(AppError::Validation(format!("Unknown filter '{}'", other))),
        }
    }

    pub fn matches(&self, member: &Member, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Plan(plan) => member
                .subscription
                .as_ref()
                .is_some_and(|s| &s.plan == plan),
            Self::Inactive => compute_status(member, today) == MemberStatus::Inactive,
            Self::Expired => compute_status(member, today) == MemberStatus::Expired,
            Self::ExpiringSoon => compute_status(member, today) == MemberStatus::ExpiringSoon,
            Self::WithinDays(n) => {
                compute_status(member, today) != MemberStatus::Inactive
                    && member
                        .subscription
                        .as_ref()
                        .map(|s| days_remaining(s.end_date, today))
                        .is_some_and(|d| (0..=*n).contains(&d))
            }
        }
    }
}

/// Roster ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberSort {
    /// Soonest end date first; members without one sort last
    #[default]
    DaysRemaining,
    /// Case-insensitive name
    Name,
    /// Most recently created first
    Newest,
}

impl std::str::FromStr for MemberSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days_remaining" => Ok(Self::DaysRemaining),
            "name" => Ok(Self::Name),
            "newest" => Ok(Self::Newest),
            other => Err(AppError::Validation(format!("Unknown sort '{}'", other))),
        }
    }
}

/// Apply `filter` to the non-admin members.
pub fn filter_members(members: Vec<Member>, filter: &MemberFilter, today: NaiveDate) -> Vec<Member> {
    members
        .into_iter()
        .filter(|m| !m.is_admin())
        .filter(|m| filter.matches(m, today))
        .collect()
}

/// Stable in-place sort.
pub fn sort_members(members: &mut [Member], sort: MemberSort) {
    match sort {
        MemberSort::DaysRemaining => members.sort_by(|a, b| {
            let a_end = a.subscription.as_ref().map(|s| s.end_date);
            let b_end = b.subscription.as_ref().map(|s| s.end_date);
            match (a_end, b_end) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        MemberSort::Name => {
            members.sort_by_cached_key(|m| m.name.to_lowercase());
        }
        MemberSort::Newest => members.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}
