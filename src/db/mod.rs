// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] is the document-store contract the services rely on.
//! [`FirestoreDb`] is the production backend, [`MemoryDb`] keeps everything
//! in process for tests and local development.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ActivityLog, LogEntry, Member};

/// Collection names as constants.
pub mod collections {
    pub const MEMBERS: &str = "members";
    /// Email claims keyed by normalised email; enforces uniqueness
    pub const MEMBER_EMAILS: &str = "member_emails";
    /// Keyed by `{member_id}_{date}`
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

/// Document store operations used by the services.
///
/// Each call is a single unit of work; there are no cross-call transactions.
#[async_trait]
pub trait Database: Send + Sync {
    // ─── Members ─────────────────────────────────────────────────

    /// Insert a new member. Fails with [`AppError::DuplicateEmail`] if the
    /// (normalised) email is already claimed.
    async fn create_member(&self, member: &Member) -> Result<(), AppError>;

    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError>;

    /// Look up by normalised email.
    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError>;

    /// All members, in store-native order.
    async fn list_members(&self) -> Result<Vec<Member>, AppError>;

    /// Replace an existing member document. The email is never changed here.
    async fn update_member(&self, member: &Member) -> Result<(), AppError>;

    /// Delete a member with its email claim and activity logs.
    ///
    /// Returns the number of documents removed (0 if the member did not exist).
    async fn delete_member(&self, id: Uuid) -> Result<usize, AppError>;

    // ─── Activity Logs ───────────────────────────────────────────

    /// Create the (member, date) log or replace its editable fields in place.
    ///
    /// Never creates a second document for the same pair. A lost creation
    /// race is reported as [`AppError::Conflict`].
    async fn upsert_log(
        &self,
        member_id: Uuid,
        date: &str,
        entry: LogEntry,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, AppError>;

    async fn get_log(&self, member_id: Uuid, date: &str) -> Result<Option<ActivityLog>, AppError>;

    /// All logs of one member, in store-native order.
    async fn list_logs(&self, member_id: Uuid) -> Result<Vec<ActivityLog>, AppError>;
}
