//! Member model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Access role of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

/// A member's current plan entitlement.
///
/// A member without a subscription is represented by `None` on
/// [`Member::subscription`], never by empty fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: String,
    pub start_date: NaiveDate,
    /// Always on or after `start_date`.
    pub end_date: NaiveDate,
}

/// Free-form contact and body details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Member record stored in the `members` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Also used as document ID
    pub id: Uuid,
    pub name: String,
    /// Normalised (trimmed, lowercase)
    pub email: String,
    /// Argon2 PHC string; never leaves the server
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Calendar day the member registered on.
    pub fn member_since(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// Point-in-time classification of a member's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Admin,
    Inactive,
    Expired,
    ExpiringSoon,
    Active,
}

/// Public view of a member. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
    pub subscription: Option<Subscription>,
    pub status: MemberStatus,
    /// Days until the subscription ends; negative once lapsed
    pub days_remaining: Option<i64>,
    pub created_at: String,
}

impl MemberResponse {
    /// Build the public view, deriving status relative to `today`.
    pub fn from_member(member: &Member, today: NaiveDate) -> Self {
        use crate::services::subscription::{compute_status, days_remaining};

        Self {
            id: member.id,
            name: member.name.clone(),
            email: member.email.clone(),
            role: member.role,
            profile: member.profile.clone(),
            subscription: member.subscription.clone(),
            status: compute_status(member, today),
            days_remaining: member
                .subscription
                .as_ref()
                .map(|s| days_remaining(s.end_date, today)),
            created_at: crate::time_utils::format_utc_rfc3339(member.created_at),
        }
    }
}

/// Normalise an email for storage and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_member_without_subscription_deserializes() {
        let json = serde_json::json!({
            "id": "9f1c2d3e-4b5a-4c6d-8e7f-001122334455",
            "name": "Asha",
            "email": "asha@example.com",
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$abc$def",
            "created_at": "2024-01-01T00:00:00Z"
        });

        let member: Member = serde_json::from_value(json).unwrap();
        assert_eq!(member.role, Role::Member);
        assert!(member.subscription.is_none());
        assert_eq!(member.profile, Profile::default());
    }
}
