// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore layout: members keyed by id, an email-claim map
//! for uniqueness and logs keyed by (member, date). DashMap entry locks
//! make find-or-create atomic per key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppError;
use crate::models::{ActivityLog, LogEntry, Member};

/// In-memory database; cheap to clone, clones share state.
#[derive(Clone, Default)]
pub struct MemoryDb {
    members: Arc<DashMap<Uuid, Member>>,
    emails: Arc<DashMap<String, Uuid>>,
    logs: Arc<DashMap<(Uuid, String), ActivityLog>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored activity logs across all members.
    pub fn log_count(&self) -> usize {
        self.logs.len()
    }
}

#[async_trait]
impl Database for MemoryDb {
    async fn create_member(&self, member: &Member) -> Result<(), AppError> {
        match self.emails.entry(member.email.clone()) {
            Entry::Occupied(_) => return Err(AppError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(member.id);
            }
        }
        self.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        Ok(self.members.get(&id).map(|m| m.value().clone()))
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.get_member(id).await
    }

    async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        Ok(self.members.iter().map(|m| m.value().clone()).collect())
    }

    async fn update_member(&self, member: &Member) -> Result<(), AppError> {
        match self.members.get_mut(&member.id) {
            Some(mut existing) => {
                *existing = member.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Member {} not found", member.id))),
        }
    }

    async fn delete_member(&self, id: Uuid) -> Result<usize, AppError> {
        let Some((_, member)) = self.members.remove(&id) else {
            return Ok(0);
        };
        let mut deleted = 1;

        if self.emails.remove(&member.email).is_some() {
            deleted += 1;
        }

        let before = self.logs.len();
        self.logs.retain(|(owner, _), _| *owner != id);
        deleted += before.saturating_sub(self.logs.len());

        Ok(deleted)
    }

    async fn upsert_log(
        &self,
        member_id: Uuid,
        date: &str,
        entry: LogEntry,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, AppError> {
        let log = match self.logs.entry((member_id, date.to_string())) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().apply(entry, now);
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot
                .insert(ActivityLog::new(member_id, date.to_string(), entry, now))
                .clone(),
        };
        Ok(log)
    }

    async fn get_log(&self, member_id: Uuid, date: &str) -> Result<Option<ActivityLog>, AppError> {
        Ok(self
            .logs
            .get(&(member_id, date.to_string()))
            .map(|l| l.value().clone()))
    }

    async fn list_logs(&self, member_id: Uuid) -> Result<Vec<ActivityLog>, AppError> {
        Ok(self
            .logs
            .iter()
            .filter(|l| l.key().0 == member_id)
            .map(|l| l.value().clone())
            .collect())
    }
}
