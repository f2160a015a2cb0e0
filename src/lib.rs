// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gym-Pro: membership and workout tracking for a small gym
//!
//! This crate provides the backend API for member accounts, subscription
//! status, admin reporting and daily activity logs, plus a typed client
//! for the same API.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{ActivityLogService, AuthService, MembershipService, PasswordHasher, TokenService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Database>,
    pub auth: AuthService,
    pub membership: MembershipService,
    pub activity: ActivityLogService,
}

impl AppState {
    /// Wire the services over `db`.
    pub fn new(config: Config, db: Arc<dyn Database>) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt_signing_key, config.session_ttl_days);
        let hasher = PasswordHasher::new(config.password_hashing)?;

        Ok(Self {
            auth: AuthService::new(db.clone(), tokens, hasher),
            membership: MembershipService::new(db.clone(), config.plans.clone()),
            activity: ActivityLogService::new(db.clone()),
            config,
            db,
        })
    }
}
