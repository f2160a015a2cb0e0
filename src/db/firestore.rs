// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Members (profile, role, embedded subscription)
//! - Member email claims (case-insensitive uniqueness)
//! - Activity logs (one document per member and day)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{collections, Database};
use crate::error::AppError;
use crate::models::{ActivityLog, LogEntry, Member};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Document stored in `member_emails`, keyed by the encoded email.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    member_id: Uuid,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Document ID for an email claim. Emails may contain characters that
    /// are awkward in document paths.
    fn email_doc_id(email: &str) -> String {
        urlencoding::encode(email).into_owned()
    }

    async fn get_claim(&self, email: &str) -> Result<Option<EmailClaim>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MEMBER_EMAILS)
            .obj()
            .one(&Self::email_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl Database for FirestoreDb {
    // ─── Member Operations ───────────────────────────────────────

    async fn create_member(&self, member: &Member) -> Result<(), AppError> {
        let client = self.get_client()?;

        // Claim the email first; create-only semantics reject a second claim.
        let claim = EmailClaim {
            member_id: member.id,
        };
        let inserted: Result<EmailClaim, FirestoreError> = client
            .fluent()
            .insert()
            .into(collections::MEMBER_EMAILS)
            .document_id(Self::email_doc_id(&member.email))
            .object(&claim)
            .execute()
            .await;
        match inserted {
            Ok(_) => {}
            Err(FirestoreError::DataConflictError(_)) => return Err(AppError::DuplicateEmail),
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        let created: Result<Member, FirestoreError> = client
            .fluent()
            .insert()
            .into(collections::MEMBERS)
            .document_id(member.id.to_string())
            .object(member)
            .execute()
            .await;

        if let Err(e) = created {
            // Release the claim so the email is not stranded.
            if let Err(cleanup) = self
                .delete_doc(collections::MEMBER_EMAILS, &Self::email_doc_id(&member.email))
                .await
            {
                tracing::warn!(error = %cleanup, "Failed to release email claim after failed insert");
            }
            return Err(AppError::Database(e.to_string()));
        }

        Ok(())
    }

    async fn get_member(&self, id: Uuid) -> Result<Option<Member>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::MEMBERS)
            .obj()
            .one(&id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_member_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        match self.get_claim(email).await? {
            Some(claim) => self.get_member(claim.member_id).await,
            None => Ok(None),
        }
    }

    async fn list_members(&self) -> Result<Vec<Member>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::MEMBERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace an existing member document.
    ///
    /// The write carries an exists precondition, so a member deleted
    /// concurrently is reported as `NotFound` instead of being recreated
    /// without its email claim.
    async fn update_member(&self, member: &Member) -> Result<(), AppError> {
        let updated: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::MEMBERS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(member.id.to_string())
            .object(member)
            .execute()
            .await;

        match updated {
            Ok(()) => Ok(()),
            Err(FirestoreError::DataNotFoundError(_)) => {
                Err(AppError::NotFound(format!("Member {} not found", member.id)))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn delete_member(&self, id: Uuid) -> Result<usize, AppError> {
        let Some(member) = self.get_member(id).await? else {
            return Ok(0);
        };

        // Owned logs first, so a failure never leaves logs without an owner.
        let logs = self.list_logs(id).await?;
        let log_count = logs.len();

        stream::iter(logs)
            .map(|log| async move {
                self.delete_doc(
                    collections::ACTIVITY_LOGS,
                    &ActivityLog::document_id(log.member_id, &log.date),
                )
                .await
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        self.delete_doc(collections::MEMBERS, &id.to_string()).await?;
        self.delete_doc(
            collections::MEMBER_EMAILS,
            &Self::email_doc_id(&member.email),
        )
        .await?;

        let deleted = log_count + 2;
        tracing::info!(member_id = %id, deleted, "Member data deletion complete");
        Ok(deleted)
    }

    // ─── Activity Log Operations ─────────────────────────────────

    async fn upsert_log(
        &self,
        member_id: Uuid,
        date: &str,
        entry: LogEntry,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, AppError> {
        let client = self.get_client()?;
        let doc_id = ActivityLog::document_id(member_id, date);

        if let Some(mut existing) = self.get_log(member_id, date).await? {
            existing.apply(entry, now);
            let _: () = client
                .fluent()
                .update()
                .in_col(collections::ACTIVITY_LOGS)
                .document_id(&doc_id)
                .object(&existing)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(existing);
        }

        let log = ActivityLog::new(member_id, date.to_string(), entry, now);
        let inserted: Result<ActivityLog, FirestoreError> = client
            .fluent()
            .insert()
            .into(collections::ACTIVITY_LOGS)
            .document_id(&doc_id)
            .object(&log)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(log),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::warn!(member_id = %member_id, date, "Lost creation race for activity log");
                Err(AppError::Conflict(format!(
                    "Activity log for {} was created concurrently; retry",
                    date
                )))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn get_log(&self, member_id: Uuid, date: &str) -> Result<Option<ActivityLog>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVITY_LOGS)
            .obj()
            .one(&ActivityLog::document_id(member_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_logs(&self, member_id: Uuid) -> Result<Vec<ActivityLog>, AppError> {
        let member_id = member_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_LOGS)
            .filter(move |q| q.for_all([q.field("member_id").eq(member_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_doc_id_is_path_safe() {
        let id = FirestoreDb::email_doc_id("a/b+c@example.com");
        assert!(!id.contains('/'));
        assert!(id.ends_with("example.com"));
    }

    #[tokio::test]
    async fn test_offline_mode_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.list_members().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
