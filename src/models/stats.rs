//! Admin dashboard aggregates over the member roster.
//!
//! Computed on demand from the member collection; nothing here is stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::PlanCatalog;
use crate::models::{Member, MemberStatus};
use crate::services::subscription::compute_status;

/// Roster-wide figures for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Sum of plan prices over every member holding a plan
    pub estimated_revenue: u64,
    /// Members whose subscription has not lapsed (active or expiring soon)
    pub active_count: u32,
    /// Members with 0..=5 days remaining
    pub expiring_count: u32,
    /// Members holding a plan that has lapsed
    pub expired_count: u32,
    /// All non-admin members
    pub total_count: u32,
}

impl AdminStats {
    /// Aggregate the roster as of `today`. Admins are not counted.
    pub fn compute(members: &[Member], plans: &PlanCatalog, today: NaiveDate) -> Self {
        let mut stats = AdminStats::default();

        for member in members.iter().filter(|m| !m.is_admin()) {
            stats.total_count += 1;

            if let Some(subscription) = &member.subscription {
                stats.estimated_revenue += plans.price_of(&subscription.plan);
            }

            match compute_status(member, today) {
                MemberStatus::Active => stats.active_count += 1,
                MemberStatus::ExpiringSoon => {
                    stats.active_count += 1;
                    stats.expiring_count += 1;
                }
                MemberStatus::Expired => stats.expired_count += 1,
                MemberStatus::Inactive | MemberStatus::Admin => {}
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Role, Subscription};
    use chrono::Duration;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn make_member(role: Role, plan: Option<&str>, days_left: i64) -> Member {
        Member {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            role,
            profile: Profile::default(),
            subscription: plan.map(|p| Subscription {
                plan: p.to_string(),
                start_date: today() - Duration::days(30),
                end_date: today() + Duration::days(days_left),
            }),
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_compute_admin_stats() {
        let members = vec![
            make_member(Role::Member, Some("Strength"), 30),
            make_member(Role::Member, Some("Strength+Cardio"), 3),
            make_member(Role::Member, Some("Strength"), -2),
            make_member(Role::Member, None, 0),
            make_member(Role::Admin, Some("Strength"), 30),
        ];

        let stats = AdminStats::compute(&members, &PlanCatalog::default(), today());

        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.estimated_revenue, 1500 + 2000 + 1500);
        assert_eq!(stats.active_count, 2);
        assert_eq!(stats.expiring_count, 1);
        assert_eq!(stats.expired_count, 1);
    }

    #[test]
    fn test_expiring_window_is_inclusive() {
        let members = vec![
            make_member(Role::Member, Some("Strength"), 0),
            make_member(Role::Member, Some("Strength"), 5),
            make_member(Role::Member, Some("Strength"), 6),
        ];

        let stats = AdminStats::compute(&members, &PlanCatalog::default(), today());

        assert_eq!(stats.expiring_count, 2);
        assert_eq!(stats.active_count, 3);
    }

    #[test]
    fn test_empty_roster() {
        let stats = AdminStats::compute(&[], &PlanCatalog::default(), today());
        assert_eq!(stats, AdminStats::default());
    }
}
