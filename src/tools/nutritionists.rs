//! Nutritionist MCP Tools
//!
//! Account registration, profile and subscription management.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    Nutritionist, NutritionistCreate, NutritionistUpdate, SubscriptionPlan, SubscriptionStatus,
};

use super::patients::load_nutritionist;

/// Response for register_nutritionist
#[derive(Debug, Serialize)]
pub struct RegisterNutritionistResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub subscription_status: SubscriptionStatus,
    pub trial_end_date: Option<String>,
}

/// Response for subscription_status
#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    pub nutritionist_id: i64,
    pub status: SubscriptionStatus,
    pub plan: Option<SubscriptionPlan>,
    pub is_active: bool,
    pub message: String,
    pub trial_end_date: Option<String>,
    pub subscription_end_date: Option<String>,
    pub patient_count: i64,
    /// `None` means unlimited
    pub patient_limit: Option<i64>,
}

/// Response for upgrade_subscription
#[derive(Debug, Serialize)]
pub struct UpgradeSubscriptionResponse {
    pub success: bool,
    pub plan: SubscriptionPlan,
    pub subscription_start_date: Option<String>,
    pub subscription_end_date: Option<String>,
    pub patient_limit: Option<i64>,
}

/// Register a nutritionist with a fresh trial
pub fn register_nutritionist(
    db: &Database,
    data: NutritionistCreate,
    now: NaiveDateTime,
) -> Result<RegisterNutritionistResponse, String> {
    let email = data.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(format!("Invalid email: '{}'", email));
    }
    if data.first_name.trim().is_empty() || data.last_name.trim().is_empty() {
        return Err("First and last name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = Nutritionist::get_by_email(&conn, email)
        .map_err(|e| format!("Database error: {}", e))?;
    if existing.is_some() {
        return Err(format!("Email already registered: {}", email.to_lowercase()));
    }

    let nutritionist = Nutritionist::create(&conn, &data, now)
        .map_err(|e| format!("Failed to register nutritionist: {}", e))?;

    info!(nutritionist_id = nutritionist.id, "Registered nutritionist");

    Ok(RegisterNutritionistResponse {
        id: nutritionist.id,
        name: nutritionist.full_name(),
        email: nutritionist.email,
        subscription_status: nutritionist.subscription_status,
        trial_end_date: nutritionist.trial_end_date,
    })
}

/// Get a nutritionist by ID
pub fn get_nutritionist(db: &Database, id: i64) -> Result<Option<Nutritionist>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Nutritionist::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get nutritionist: {}", e))
}

/// Update profile fields
pub fn update_nutritionist(
    db: &Database,
    id: i64,
    data: NutritionistUpdate,
) -> Result<Nutritionist, String> {
    if matches!(data.first_name.as_deref(), Some(n) if n.trim().is_empty())
        || matches!(data.last_name.as_deref(), Some(n) if n.trim().is_empty())
    {
        return Err("First and last name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Nutritionist::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update nutritionist: {}", e))?
        .ok_or_else(|| format!("Nutritionist not found with id: {}", id))
}

/// Subscription state, access check and patient usage
pub fn subscription_status(
    db: &Database,
    id: i64,
    now: NaiveDateTime,
) -> Result<SubscriptionStatusResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let nutritionist = load_nutritionist(&conn, id)?;
    let patient_count = Nutritionist::patient_count(&conn, id)
        .map_err(|e| format!("Failed to count patients: {}", e))?;
    let (is_active, message) = nutritionist.check_subscription(now);

    Ok(SubscriptionStatusResponse {
        nutritionist_id: nutritionist.id,
        status: nutritionist.subscription_status,
        plan: nutritionist.subscription_plan,
        is_active,
        message,
        patient_limit: nutritionist.patient_limit(),
        trial_end_date: nutritionist.trial_end_date,
        subscription_end_date: nutritionist.subscription_end_date,
        patient_count,
    })
}

/// Switch to a paid plan for one period
pub fn upgrade_subscription(
    db: &Database,
    id: i64,
    plan: SubscriptionPlan,
    now: NaiveDateTime,
) -> Result<UpgradeSubscriptionResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let nutritionist = Nutritionist::upgrade(&conn, id, plan, now)
        .map_err(|e| format!("Failed to upgrade subscription: {}", e))?
        .ok_or_else(|| format!("Nutritionist not found with id: {}", id))?;

    info!(nutritionist_id = id, plan = plan.as_str(), "Upgraded subscription");

    Ok(UpgradeSubscriptionResponse {
        success: true,
        plan,
        patient_limit: nutritionist.patient_limit(),
        subscription_start_date: nutritionist.subscription_start_date,
        subscription_end_date: nutritionist.subscription_end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn registration(email: &str) -> NutritionistCreate {
        NutritionistCreate {
            email: email.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_and_status() {
        let db = Database::in_memory().unwrap();
        let registered = register_nutritionist(&db, registration("ana@test.com"), now()).unwrap();
        assert_eq!(registered.subscription_status, SubscriptionStatus::Trial);

        let status = subscription_status(&db, registered.id, now()).unwrap();
        assert!(status.is_active);
        assert_eq!(status.message, "Trial active until 2025-07-01");
        assert_eq!(status.patient_count, 0);
        assert_eq!(status.patient_limit, Some(3));
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_input() {
        let db = Database::in_memory().unwrap();
        register_nutritionist(&db, registration("ana@test.com"), now()).unwrap();

        assert!(register_nutritionist(&db, registration("ANA@test.com"), now())
            .unwrap_err()
            .contains("already registered"));
        assert!(register_nutritionist(&db, registration("not-an-email"), now()).is_err());

        let mut nameless = registration("b@test.com");
        nameless.first_name = "  ".to_string();
        assert!(register_nutritionist(&db, nameless, now()).is_err());
    }

    #[test]
    fn test_upgrade_then_expire() {
        let db = Database::in_memory().unwrap();
        let id = register_nutritionist(&db, registration("ana@test.com"), now()).unwrap().id;

        let upgraded = upgrade_subscription(&db, id, SubscriptionPlan::Enterprise, now()).unwrap();
        assert_eq!(upgraded.patient_limit, None);
        assert_eq!(upgraded.subscription_end_date.as_deref(), Some("2025-07-01 09:00:00"));

        let status = subscription_status(&db, id, now() + Duration::days(31)).unwrap();
        assert!(!status.is_active);
        assert_eq!(status.message, "Subscription expired");
    }

    #[test]
    fn test_update_profile() {
        let db = Database::in_memory().unwrap();
        let id = register_nutritionist(&db, registration("ana@test.com"), now()).unwrap().id;

        let data = NutritionistUpdate {
            specialization: Some("Clinical nutrition".to_string()),
            ..Default::default()
        };
        let updated = update_nutritionist(&db, id, data).unwrap();
        assert_eq!(updated.specialization.as_deref(), Some("Clinical nutrition"));

        assert!(update_nutritionist(&db, 999, NutritionistUpdate {
            bio: Some("x".to_string()),
            ..Default::default()
        })
        .is_err());
    }
}
