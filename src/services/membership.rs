// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Member records: admin roster, subscription assignment and profiles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::config::PlanCatalog;
use crate::db::Database;
use crate::error::AppError;
use crate::models::activity::measurement_update;
use crate::models::{AdminStats, Member, MemberResponse, Role, Subscription};
use crate::services::auth::AuthMember;
use crate::services::subscription::{
    filter_members, sort_members, subscription_end_date, MemberFilter, MemberSort,
};

/// Admin edit of a member record.
///
/// Replaces name, phone and the subscription as a whole. A missing or
/// blank `plan` clears the subscription. `weight`, `height` and `role`
/// are left alone when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminMemberUpdate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_months: Option<i64>,
    /// `Some(None)` clears the stored value
    #[serde(
        default,
        deserialize_with = "measurement_update",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "measurement_update",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Self-service profile edit. Plan and dates are not editable here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct MembershipService {
    db: Arc<dyn Database>,
    plans: PlanCatalog,
}

impl MembershipService {
    pub fn new(db: Arc<dyn Database>, plans: PlanCatalog) -> Self {
        Self { db, plans }
    }

    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    async fn load(&self, id: Uuid) -> Result<Member, AppError> {
        self.db
            .get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    pub async fn get(&self, id: Uuid, today: NaiveDate) -> Result<MemberResponse, AppError> {
        Ok(MemberResponse::from_member(&self.load(id).await?, today))
    }

    /// Roster view for admins. Admins themselves never appear.
    pub async fn list(
        &self,
        filter: &MemberFilter,
        sort: Option<MemberSort>,
        today: NaiveDate,
    ) -> Result<Vec<MemberResponse>, AppError> {
        let mut members = filter_members(self.db.list_members().await?, filter, today);
        if let Some(sort) = sort {
            sort_members(&mut members, sort);
        }
        Ok(members
            .iter()
            .map(|m| MemberResponse::from_member(m, today))
            .collect())
    }

    pub async fn stats(&self, today: NaiveDate) -> Result<AdminStats, AppError> {
        let members = self.db.list_members().await?;
        Ok(AdminStats::compute(&members, &self.plans, today))
    }

    /// Apply an admin edit to `target_id`.
    ///
    /// A new subscription always replaces the previous one; it never
    /// extends it.
    pub async fn admin_update(
        &self,
        actor: AuthMember,
        target_id: Uuid,
        update: AdminMemberUpdate,
        today: NaiveDate,
    ) -> Result<MemberResponse, AppError> {
        let update = AdminMemberUpdate {
            name: update.name.trim().to_string(),
            ..update
        };
        update.validate()?;

        let mut member = self.load(target_id).await?;

        if let Some(role) = update.role {
            if role != member.role && actor.member_id == member.id {
                return Err(AppError::Forbidden(
                    "Admins cannot change their own role".to_string(),
                ));
            }
            member.role = role;
        }

        member.subscription = self.build_subscription(&update)?;
        member.name = update.name;
        member.profile.phone = clean_phone(update.phone);
        if let Some(weight) = update.weight {
            member.profile.weight = weight;
        }
        if let Some(height) = update.height {
            member.profile.height = height;
        }

        self.db.update_member(&member).await?;

        tracing::info!(
            member_id = %member.id,
            admin_id = %actor.member_id,
            plan = member.subscription.as_ref().map(|s| s.plan.as_str()).unwrap_or("none"),
            "Member updated by admin"
        );

        Ok(MemberResponse::from_member(&member, today))
    }

    fn build_subscription(&self, update: &AdminMemberUpdate) -> Result<Option<Subscription>, AppError> {
        let Some(plan) = update
            .plan
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            return Ok(None);
        };

        if !self.plans.contains(plan) {
            return Err(AppError::Validation(format!("Unknown plan '{}'", plan)));
        }
        let start_date = update
            .start_date
            .ok_or_else(|| AppError::Validation("startDate is required with a plan".to_string()))?;
        let months = update.duration_months.ok_or_else(|| {
            AppError::Validation("durationMonths is required with a plan".to_string())
        })?;

        Ok(Some(Subscription {
            plan: plan.to_string(),
            start_date,
            end_date: subscription_end_date(start_date, months)?,
        }))
    }

    /// Member edit of their own name and phone.
    pub async fn update_profile(
        &self,
        member_id: Uuid,
        update: ProfileUpdate,
        today: NaiveDate,
    ) -> Result<MemberResponse, AppError> {
        let update = ProfileUpdate {
            name: update.name.trim().to_string(),
            phone: update.phone,
        };
        update.validate()?;

        let mut member = self.load(member_id).await?;
        member.name = update.name;
        member.profile.phone = clean_phone(update.phone);

        self.db.update_member(&member).await?;
        tracing::info!(member_id = %member.id, "Profile updated");

        Ok(MemberResponse::from_member(&member, today))
    }

    /// Delete a member and everything they own. Admin records are protected.
    pub async fn delete(&self, actor: AuthMember, target_id: Uuid) -> Result<(), AppError> {
        let member = self.load(target_id).await?;
        if member.is_admin() {
            return Err(AppError::Forbidden(
                "Admin accounts cannot be deleted".to_string(),
            ));
        }

        let deleted = self.db.delete_member(target_id).await?;
        tracing::info!(
            member_id = %target_id,
            admin_id = %actor.member_id,
            deleted,
            "Member deleted"
        );
        Ok(())
    }
}

fn clean_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{MemberStatus, Profile};
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seed(db: &MemoryDb, name: &str, role: Role) -> Member {
        let member = Member {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: String::new(),
            role,
            profile: Profile::default(),
            subscription: None,
            created_at: Utc::now(),
        };
        db.create_member(&member).await.unwrap();
        member
    }

    fn admin_actor(admin: &Member) -> AuthMember {
        AuthMember {
            member_id: admin.id,
            role: Role::Admin,
        }
    }

    fn plan_update(name: &str, plan: &str, start: NaiveDate, months: i64) -> AdminMemberUpdate {
        AdminMemberUpdate {
            name: name.to_string(),
            plan: Some(plan.to_string()),
            start_date: Some(start),
            duration_months: Some(months),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_subscription_clamps_end_of_month() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());

        let updated = service
            .admin_update(
                admin_actor(&admin),
                member.id,
                plan_update("Ravi", "Strength", date(2024, 1, 31), 1),
                date(2024, 2, 1),
            )
            .await
            .unwrap();

        let subscription = updated.subscription.unwrap();
        assert_eq!(subscription.end_date, date(2024, 2, 29));
        assert_eq!(updated.status, MemberStatus::Active);
    }

    #[tokio::test]
    async fn test_renewal_replaces_previous_term() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());
        let actor = admin_actor(&admin);

        service
            .admin_update(actor, member.id, plan_update("Ravi", "Strength", date(2024, 1, 1), 12), date(2024, 1, 1))
            .await
            .unwrap();
        let renewed = service
            .admin_update(
                actor,
                member.id,
                plan_update("Ravi", "Strength+Cardio", date(2024, 3, 1), 1),
                date(2024, 3, 1),
            )
            .await
            .unwrap();

        let subscription = renewed.subscription.unwrap();
        assert_eq!(subscription.plan, "Strength+Cardio");
        assert_eq!(subscription.start_date, date(2024, 3, 1));
        assert_eq!(subscription.end_date, date(2024, 4, 1));
    }

    #[tokio::test]
    async fn test_admin_update_rejects_bad_plan_and_duration() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());
        let today = date(2024, 1, 1);

        let unknown = service
            .admin_update(admin_actor(&admin), member.id, plan_update("Ravi", "Yoga", today, 1), today)
            .await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let zero = service
            .admin_update(admin_actor(&admin), member.id, plan_update("Ravi", "Strength", today, 0), today)
            .await;
        assert!(matches!(zero, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_clearing_plan_makes_member_inactive() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());
        let today = date(2024, 1, 1);

        service
            .admin_update(admin_actor(&admin), member.id, plan_update("Ravi", "Strength", today, 1), today)
            .await
            .unwrap();
        let cleared = service
            .admin_update(
                admin_actor(&admin),
                member.id,
                AdminMemberUpdate {
                    name: "Ravi".to_string(),
                    ..Default::default()
                },
                today,
            )
            .await
            .unwrap();

        assert!(cleared.subscription.is_none());
        assert_eq!(cleared.status, MemberStatus::Inactive);
    }

    #[tokio::test]
    async fn test_admin_cannot_change_own_role() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());

        let result = service
            .admin_update(
                admin_actor(&admin),
                admin.id,
                AdminMemberUpdate {
                    name: "Admin".to_string(),
                    role: Some(Role::Member),
                    ..Default::default()
                },
                date(2024, 1, 1),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_profile_update_keeps_subscription() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());
        let today = date(2024, 1, 1);
        service
            .admin_update(admin_actor(&admin), member.id, plan_update("Ravi", "Strength", today, 3), today)
            .await
            .unwrap();

        let updated = service
            .update_profile(
                member.id,
                ProfileUpdate {
                    name: " Ravi K ".to_string(),
                    phone: Some("+91 98765 43210".to_string()),
                },
                today,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ravi K");
        assert_eq!(updated.profile.phone.as_deref(), Some("+91 98765 43210"));
        assert_eq!(updated.subscription.unwrap().plan, "Strength");
    }

    #[tokio::test]
    async fn test_delete_protects_admins() {
        let db = MemoryDb::new();
        let admin = seed(&db, "Admin", Role::Admin).await;
        let other_admin = seed(&db, "Other", Role::Admin).await;
        let member = seed(&db, "Ravi", Role::Member).await;
        let service = MembershipService::new(Arc::new(db.clone()), PlanCatalog::default());

        assert!(matches!(
            service.delete(admin_actor(&admin), other_admin.id).await,
            Err(AppError::Forbidden(_))
        ));
        service.delete(admin_actor(&admin), member.id).await.unwrap();
        assert!(matches!(
            service.delete(admin_actor(&admin), member.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(db.list_members().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_excludes_admins() {
        let db = MemoryDb::new();
        seed(&db, "Admin", Role::Admin).await;
        seed(&db, "Ravi", Role::Member).await;
        seed(&db, "Meera", Role::Member).await;
        let service = MembershipService::new(Arc::new(db), PlanCatalog::default());

        let members = service
            .list(&MemberFilter::All, Some(MemberSort::Name), date(2024, 1, 1))
            .await
            .unwrap();

        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Meera", "Ravi"]);
    }
}
