//! Data models
//!
//! Rust structs representing database entities.

use chrono::{NaiveDate, NaiveDateTime};

mod anthropometrics;
mod consultation;
mod food_exchange;
mod macros;
mod meal_plan;
mod menu;
mod nutritionist;
mod patient;
mod preferences;
mod snack;

pub use anthropometrics::Anthropometrics;
pub use consultation::{
    Consultation, ConsultationCreate, ConsultationUpdate, DerivedFigures, UpcomingAppointment,
};
pub use food_exchange::{
    ExchangeCategory, FoodExchange, FoodExchangeCreate, FoodExchangeUpdate, Micronutrients,
};
pub use macros::Macros;
pub use meal_plan::{MealPlan, MealPlanCreate, MealPlanDetail, MealPlanItem, MealPlanItemCreate};
pub use menu::{Menu, MenuCategory, MenuCreate, MenuUpdate};
pub use nutritionist::{
    Nutritionist, NutritionistCreate, NutritionistUpdate, Role, SubscriptionError,
    SubscriptionPlan, SubscriptionStatus, SUBSCRIPTION_PERIOD_DAYS, TRIAL_PATIENT_LIMIT,
};
pub use patient::{DietType, Patient, PatientCreate, PatientUpdate};
pub use preferences::{
    BudgetLevel, CookingTime, Preferences, PreferencesCreate, PreferencesUpdate, TASTE_SCORE_RANGE,
};
pub use snack::{Snack, SnackCategory, SnackCreate, SnackFilter, SnackFlags, SnackUpdate};

/// Storage format for timestamps, matching SQLite's `datetime('now')`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a stored or user-supplied timestamp. A bare date means midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parse a `YYYY-MM-DD` date, ignoring any time part
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use rusqlite::Connection;

    use super::*;
    use crate::calculations::Gender;
    use crate::db::DbResult;

    /// A nutritionist on a fresh trial
    pub fn nutritionist(conn: &Connection, email: &str) -> DbResult<Nutritionist> {
        let data = NutritionistCreate {
            email: email.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            ..Default::default()
        };
        Nutritionist::create(conn, &data, Utc::now().naive_utc())
    }

    pub fn patient_data(identification: &str) -> PatientCreate {
        PatientCreate {
            first_name: "Laura".to_string(),
            last_name: "Gomez".to_string(),
            identification: identification.to_string(),
            birth_date: "1990-05-14".to_string(),
            gender: Gender::Female,
            weight: 60.0,
            height: 165.0,
            ..Default::default()
        }
    }
}
