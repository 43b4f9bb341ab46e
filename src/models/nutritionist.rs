//! Nutritionist model
//!
//! Account holders. Each nutritionist owns their patients and carries a
//! subscription that gates patient access.

use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::DbResult;
use super::{format_datetime, parse_datetime};

/// Length of the free trial and of each paid subscription period
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Nutritionist,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Nutritionist => "nutritionist",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Role::Admin,
            _ => Role::Nutritionist,
        }
    }
}

/// Subscription lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Trial,
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => SubscriptionStatus::Active,
            "expired" => SubscriptionStatus::Expired,
            "cancelled" => SubscriptionStatus::Cancelled,
            _ => SubscriptionStatus::Trial,
        }
    }
}

/// Paid subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Basic,
    Professional,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Professional => "professional",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(SubscriptionPlan::Basic),
            "professional" => Some(SubscriptionPlan::Professional),
            "enterprise" => Some(SubscriptionPlan::Enterprise),
            _ => None,
        }
    }

    /// Maximum number of patients, `None` meaning unlimited
    pub fn patient_limit(&self) -> Option<i64> {
        match self {
            SubscriptionPlan::Basic => Some(50),
            SubscriptionPlan::Professional => Some(200),
            SubscriptionPlan::Enterprise => None,
        }
    }
}

/// Patient limit while on trial, or with no plan on record
pub const TRIAL_PATIENT_LIMIT: i64 = 3;

/// Reasons the subscription gate refuses an operation
#[derive(Debug, Error, PartialEq)]
pub enum SubscriptionError {
    #[error("{0}")]
    Inactive(String),

    #[error("Patient limit reached ({0} patients)")]
    PatientLimitReached(i64),
}

/// A nutritionist account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nutritionist {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub trial_start_date: Option<String>,
    pub trial_end_date: Option<String>,
    pub subscription_start_date: Option<String>,
    pub subscription_end_date: Option<String>,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for registering a nutritionist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionistCreate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
}

/// Profile fields a nutritionist may change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionistUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub specialization: Option<String>,
    pub clinic_name: Option<String>,
    pub clinic_address: Option<String>,
    pub bio: Option<String>,
}

impl Nutritionist {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            phone: row.get("phone")?,
            role: Role::from_str(row.get::<_, String>("role")?.as_str()),
            subscription_status: SubscriptionStatus::from_str(
                row.get::<_, String>("subscription_status")?.as_str(),
            ),
            subscription_plan: row
                .get::<_, Option<String>>("subscription_plan")?
                .as_deref()
                .and_then(SubscriptionPlan::from_str),
            trial_start_date: row.get("trial_start_date")?,
            trial_end_date: row.get("trial_end_date")?,
            subscription_start_date: row.get("subscription_start_date")?,
            subscription_end_date: row.get("subscription_end_date")?,
            license_number: row.get("license_number")?,
            specialization: row.get("specialization")?,
            clinic_name: row.get("clinic_name")?,
            clinic_address: row.get("clinic_address")?,
            bio: row.get("bio")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Register a nutritionist, starting a trial at `now`
    pub fn create(conn: &Connection, data: &NutritionistCreate, now: NaiveDateTime) -> DbResult<Self> {
        let trial_end = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);

        conn.execute(
            r#"
            INSERT INTO nutritionists (
                email, first_name, last_name, phone, role,
                subscription_status, trial_start_date, trial_end_date,
                license_number, specialization, clinic_name, clinic_address, bio
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'trial', ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                data.email.trim().to_lowercase(),
                data.first_name,
                data.last_name,
                data.phone,
                data.role.as_str(),
                format_datetime(now),
                format_datetime(trial_end),
                data.license_number,
                data.specialization,
                data.clinic_name,
                data.clinic_address,
                data.bio,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a nutritionist by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutritionists WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a nutritionist by email (case-insensitive)
    pub fn get_by_email(conn: &Connection, email: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutritionists WHERE email = ?1")?;

        let result = stmt.query_row([email.trim().to_lowercase()], Self::from_row);
        match result {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update profile fields
    pub fn update(conn: &Connection, id: i64, data: &NutritionistUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(first_name, "first_name");
        add_update!(last_name, "last_name");
        add_update!(phone, "phone");
        add_update!(license_number, "license_number");
        add_update!(specialization, "specialization");
        add_update!(clinic_name, "clinic_name");
        add_update!(clinic_address, "clinic_address");
        add_update!(bio, "bio");

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE nutritionists SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Switch to a paid plan for one period starting at `now`
    pub fn upgrade(
        conn: &Connection,
        id: i64,
        plan: SubscriptionPlan,
        now: NaiveDateTime,
    ) -> DbResult<Option<Self>> {
        let end = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
        conn.execute(
            r#"
            UPDATE nutritionists SET
                subscription_status = 'active',
                subscription_plan = ?1,
                subscription_start_date = ?2,
                subscription_end_date = ?3,
                updated_at = datetime('now')
            WHERE id = ?4
            "#,
            params![plan.as_str(), format_datetime(now), format_datetime(end), id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Count the patients this nutritionist owns
    pub fn patient_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE nutritionist_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether the subscription currently grants access, with a status message
    pub fn check_subscription(&self, now: NaiveDateTime) -> (bool, String) {
        match self.subscription_status {
            SubscriptionStatus::Trial => {
                match self.trial_end_date.as_deref().and_then(parse_datetime) {
                    Some(end) if now > end => (false, "Trial period expired".to_string()),
                    Some(end) => (true, format!("Trial active until {}", end.format("%Y-%m-%d"))),
                    None => (false, "Trial period expired".to_string()),
                }
            }
            SubscriptionStatus::Active => {
                match self.subscription_end_date.as_deref().and_then(parse_datetime) {
                    Some(end) if now > end => (false, "Subscription expired".to_string()),
                    Some(end) => (
                        true,
                        format!("Subscription active until {}", end.format("%Y-%m-%d")),
                    ),
                    None => (true, "Subscription active".to_string()),
                }
            }
            _ => (false, "No active subscription".to_string()),
        }
    }

    /// Maximum patients allowed, `None` meaning unlimited
    pub fn patient_limit(&self) -> Option<i64> {
        if self.subscription_status == SubscriptionStatus::Trial {
            return Some(TRIAL_PATIENT_LIMIT);
        }
        match self.subscription_plan {
            Some(plan) => plan.patient_limit(),
            None => Some(TRIAL_PATIENT_LIMIT),
        }
    }

    /// Fail unless the subscription is active
    pub fn require_active(&self, now: NaiveDateTime) -> Result<(), SubscriptionError> {
        let (active, message) = self.check_subscription(now);
        if active {
            Ok(())
        } else {
            Err(SubscriptionError::Inactive(message))
        }
    }

    /// Fail unless one more patient fits under the plan limit
    pub fn require_patient_capacity(&self, current_count: i64) -> Result<(), SubscriptionError> {
        match self.patient_limit() {
            Some(limit) if current_count >= limit => Err(SubscriptionError::PatientLimitReached(limit)),
            _ => Ok(()),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
