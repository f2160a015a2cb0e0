// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod auth;
pub mod membership;
pub mod subscription;

pub use activity::{
    derive_attendance, derive_metric_series, ActivityLogService, Aggregation, LogRequest, Metric,
    SeriesPoint,
};
pub use auth::{
    AuthMember, AuthResponse, AuthService, LoginRequest, PasswordHasher, RegisterRequest,
    TokenService,
};
pub use membership::{AdminMemberUpdate, MembershipService, ProfileUpdate};
pub use subscription::{MemberFilter, MemberSort};
