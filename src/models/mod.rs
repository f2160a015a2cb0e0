// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod member;
pub mod stats;

pub use activity::{ActivityLog, ActivityLogResponse, LogEntry, Task};
pub use member::{
    normalize_email, Member, MemberResponse, MemberStatus, Profile, Role, Subscription,
};
pub use stats::AdminStats;
