//! Patient preferences model
//!
//! Food likes, constraints and habits. At most one row per patient.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Food budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl BudgetLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetLevel::Low => "low",
            BudgetLevel::Medium => "medium",
            BudgetLevel::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" | "bajo" => BudgetLevel::Low,
            "high" | "alto" => BudgetLevel::High,
            _ => BudgetLevel::Medium,
        }
    }
}

/// Time available for cooking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CookingTime {
    /// Under 15 minutes
    Little,
    #[default]
    Medium,
    /// Over 30 minutes
    Plenty,
}

impl CookingTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            CookingTime::Little => "little",
            CookingTime::Medium => "medium",
            CookingTime::Plenty => "plenty",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "little" | "poco" => CookingTime::Little,
            "plenty" | "mucho" => CookingTime::Plenty,
            _ => CookingTime::Medium,
        }
    }
}

/// Lowest and highest taste score
pub const TASTE_SCORE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

const DEFAULT_TASTE_SCORE: i32 = 3;
const DEFAULT_SNACKS_PER_DAY: i32 = 2;

fn default_taste() -> i32 {
    DEFAULT_TASTE_SCORE
}

fn default_snacks() -> i32 {
    DEFAULT_SNACKS_PER_DAY
}

fn default_true() -> bool {
    true
}

/// A patient's preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub id: i64,
    pub patient_id: i64,
    pub favorite_foods: Option<String>,
    pub disliked_foods: Option<String>,
    pub allergies: Option<String>,
    pub cooking_methods: Option<String>,
    pub cultural_restrictions: Option<String>,
    pub budget_level: BudgetLevel,
    pub cooking_time_available: CookingTime,
    pub sweet_preference: i32,
    pub salty_preference: i32,
    pub spicy_preference: i32,
    pub sour_preference: i32,
    pub bitter_preference: i32,
    pub prefers_soft_textures: bool,
    pub prefers_crunchy_textures: bool,
    pub breakfast_time: Option<String>,
    pub lunch_time: Option<String>,
    pub dinner_time: Option<String>,
    pub snacks_per_day: i32,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesCreate {
    pub favorite_foods: Option<String>,
    pub disliked_foods: Option<String>,
    pub allergies: Option<String>,
    pub cooking_methods: Option<String>,
    pub cultural_restrictions: Option<String>,
    #[serde(default)]
    pub budget_level: BudgetLevel,
    #[serde(default)]
    pub cooking_time_available: CookingTime,
    #[serde(default = "default_taste")]
    pub sweet_preference: i32,
    #[serde(default = "default_taste")]
    pub salty_preference: i32,
    #[serde(default = "default_taste")]
    pub spicy_preference: i32,
    #[serde(default = "default_taste")]
    pub sour_preference: i32,
    #[serde(default = "default_taste")]
    pub bitter_preference: i32,
    #[serde(default = "default_true")]
    pub prefers_soft_textures: bool,
    #[serde(default = "default_true")]
    pub prefers_crunchy_textures: bool,
    pub breakfast_time: Option<String>,
    pub lunch_time: Option<String>,
    pub dinner_time: Option<String>,
    #[serde(default = "default_snacks")]
    pub snacks_per_day: i32,
    pub notes: Option<String>,
}

impl Default for PreferencesCreate {
    fn default() -> Self {
        Self {
            favorite_foods: None,
            disliked_foods: None,
            allergies: None,
            cooking_methods: None,
            cultural_restrictions: None,
            budget_level: BudgetLevel::default(),
            cooking_time_available: CookingTime::default(),
            sweet_preference: DEFAULT_TASTE_SCORE,
            salty_preference: DEFAULT_TASTE_SCORE,
            spicy_preference: DEFAULT_TASTE_SCORE,
            sour_preference: DEFAULT_TASTE_SCORE,
            bitter_preference: DEFAULT_TASTE_SCORE,
            prefers_soft_textures: true,
            prefers_crunchy_textures: true,
            breakfast_time: None,
            lunch_time: None,
            dinner_time: None,
            snacks_per_day: DEFAULT_SNACKS_PER_DAY,
            notes: None,
        }
    }
}

/// Data for updating preferences; only `Some` fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub favorite_foods: Option<String>,
    pub disliked_foods: Option<String>,
    pub allergies: Option<String>,
    pub cooking_methods: Option<String>,
    pub cultural_restrictions: Option<String>,
    pub budget_level: Option<BudgetLevel>,
    pub cooking_time_available: Option<CookingTime>,
    pub sweet_preference: Option<i32>,
    pub salty_preference: Option<i32>,
    pub spicy_preference: Option<i32>,
    pub sour_preference: Option<i32>,
    pub bitter_preference: Option<i32>,
    pub prefers_soft_textures: Option<bool>,
    pub prefers_crunchy_textures: Option<bool>,
    pub breakfast_time: Option<String>,
    pub lunch_time: Option<String>,
    pub dinner_time: Option<String>,
    pub snacks_per_day: Option<i32>,
    pub notes: Option<String>,
}

impl PreferencesCreate {
    /// Taste scores with their labels
    pub fn taste_scores(&self) -> [(&'static str, i32); 5] {
        [
            ("sweet_preference", self.sweet_preference),
            ("salty_preference", self.salty_preference),
            ("spicy_preference", self.spicy_preference),
            ("sour_preference", self.sour_preference),
            ("bitter_preference", self.bitter_preference),
        ]
    }
}

impl PreferencesUpdate {
    /// Provided taste scores with their labels
    pub fn taste_scores(&self) -> Vec<(&'static str, i32)> {
        [
            ("sweet_preference", self.sweet_preference),
            ("salty_preference", self.salty_preference),
            ("spicy_preference", self.spicy_preference),
            ("sour_preference", self.sour_preference),
            ("bitter_preference", self.bitter_preference),
        ]
        .into_iter()
        .filter_map(|(name, score)| score.map(|s| (name, s)))
        .collect()
    }
}

impl Preferences {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            favorite_foods: row.get("favorite_foods")?,
            disliked_foods: row.get("disliked_foods")?,
            allergies: row.get("allergies")?,
            cooking_methods: row.get("cooking_methods")?,
            cultural_restrictions: row.get("cultural_restrictions")?,
            budget_level: BudgetLevel::from_str(row.get::<_, String>("budget_level")?.as_str()),
            cooking_time_available: CookingTime::from_str(
                row.get::<_, String>("cooking_time_available")?.as_str(),
            ),
            sweet_preference: row.get("sweet_preference")?,
            salty_preference: row.get("salty_preference")?,
            spicy_preference: row.get("spicy_preference")?,
            sour_preference: row.get("sour_preference")?,
            bitter_preference: row.get("bitter_preference")?,
            prefers_soft_textures: row.get("prefers_soft_textures")?,
            prefers_crunchy_textures: row.get("prefers_crunchy_textures")?,
            breakfast_time: row.get("breakfast_time")?,
            lunch_time: row.get("lunch_time")?,
            dinner_time: row.get("dinner_time")?,
            snacks_per_day: row.get("snacks_per_day")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert preferences for a patient. Fails if the patient already has some.
    pub fn create(conn: &Connection, patient_id: i64, data: &PreferencesCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO patient_preferences (
                patient_id, favorite_foods, disliked_foods, allergies, cooking_methods,
                cultural_restrictions, budget_level, cooking_time_available,
                sweet_preference, salty_preference, spicy_preference, sour_preference, bitter_preference,
                prefers_soft_textures, prefers_crunchy_textures,
                breakfast_time, lunch_time, dinner_time, snacks_per_day, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                patient_id,
                data.favorite_foods,
                data.disliked_foods,
                data.allergies,
                data.cooking_methods,
                data.cultural_restrictions,
                data.budget_level.as_str(),
                data.cooking_time_available.as_str(),
                data.sweet_preference,
                data.salty_preference,
                data.spicy_preference,
                data.sour_preference,
                data.bitter_preference,
                data.prefers_soft_textures,
                data.prefers_crunchy_textures,
                data.breakfast_time,
                data.lunch_time,
                data.dinner_time,
                data.snacks_per_day,
                data.notes,
            ],
        )?;

        Self::get_for_patient(conn, patient_id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get the preferences of a patient
    pub fn get_for_patient(conn: &Connection, patient_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patient_preferences WHERE patient_id = ?1")?;

        let result = stmt.query_row([patient_id], Self::from_row);
        match result {
            Ok(prefs) => Ok(Some(prefs)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update the preferences of a patient
    pub fn update(conn: &Connection, patient_id: i64, data: &PreferencesUpdate) -> DbResult<Option<Self>> {
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

        add_update!(favorite_foods, "favorite_foods");
        add_update!(disliked_foods, "disliked_foods");
        add_update!(allergies, "allergies");
        add_update!(cooking_methods, "cooking_methods");
        add_update!(cultural_restrictions, "cultural_restrictions");
        add_update!(sweet_preference, "sweet_preference");
        add_update!(salty_preference, "salty_preference");
        add_update!(spicy_preference, "spicy_preference");
        add_update!(sour_preference, "sour_preference");
        add_update!(bitter_preference, "bitter_preference");
        add_update!(prefers_soft_textures, "prefers_soft_textures");
        add_update!(prefers_crunchy_textures, "prefers_crunchy_textures");
        add_update!(breakfast_time, "breakfast_time");
        add_update!(lunch_time, "lunch_time");
        add_update!(dinner_time, "dinner_time");
        add_update!(snacks_per_day, "snacks_per_day");
        add_update!(notes, "notes");

        if let Some(ref budget) = data.budget_level {
            updates.push(format!("budget_level = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(budget.as_str().to_string()));
        }
        if let Some(ref time) = data.cooking_time_available {
            updates.push(format!("cooking_time_available = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(time.as_str().to_string()));
        }

        if updates.is_empty() {
            return Self::get_for_patient(conn, patient_id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE patient_preferences SET {} WHERE patient_id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(patient_id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_for_patient(conn, patient_id)
    }

    /// Delete the preferences of a patient
    pub fn delete(conn: &Connection, patient_id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM patient_preferences WHERE patient_id = ?1", [patient_id])?;
        Ok(rows > 0)
    }

    /// Whether any preferred cooking method mentions `method`
    pub fn prefers_cooking_method(&self, method: &str) -> bool {
        self.cooking_methods
            .as_deref()
            .map(|m| m.to_lowercase().contains(method))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::{nutritionist, patient_data};
    use crate::models::Patient;

    #[test]
    fn test_defaults_applied() {
        let db = Database::in_memory().unwrap();
        let prefs = db
            .with_conn(|conn| {
                let n = nutritionist(conn, "a@test.com")?;
                let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
                Preferences::create(conn, p.id, &PreferencesCreate::default())
            })
            .unwrap();

        assert_eq!(prefs.budget_level, BudgetLevel::Medium);
        assert_eq!(prefs.cooking_time_available, CookingTime::Medium);
        assert_eq!(prefs.sweet_preference, 3);
        assert_eq!(prefs.snacks_per_day, 2);
        assert!(prefs.prefers_soft_textures);
    }

    #[test]
    fn test_serde_defaults_match() {
        let parsed: PreferencesCreate = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.bitter_preference, 3);
        assert_eq!(parsed.snacks_per_day, 2);
        assert!(parsed.prefers_crunchy_textures);
    }

    #[test]
    fn test_one_per_patient() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let n = nutritionist(conn, "a@test.com")?;
            let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
            Preferences::create(conn, p.id, &PreferencesCreate::default())?;
            assert!(Preferences::create(conn, p.id, &PreferencesCreate::default()).is_err());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_partial_update_and_delete() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let n = nutritionist(conn, "a@test.com")?;
            let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
            let created = PreferencesCreate {
                favorite_foods: Some("mango".to_string()),
                ..Default::default()
            };
            Preferences::create(conn, p.id, &created)?;

            let data = PreferencesUpdate {
                budget_level: Some(BudgetLevel::Low),
                sweet_preference: Some(5),
                ..Default::default()
            };
            let updated = Preferences::update(conn, p.id, &data)?.unwrap();
            assert_eq!(updated.budget_level, BudgetLevel::Low);
            assert_eq!(updated.sweet_preference, 5);
            assert_eq!(updated.favorite_foods.as_deref(), Some("mango"));

            assert!(Preferences::delete(conn, p.id)?);
            assert!(Preferences::get_for_patient(conn, p.id)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_taste_score_out_of_range_rejected_by_schema() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let n = nutritionist(conn, "a@test.com")?;
            let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
            let data = PreferencesCreate { spicy_preference: 9, ..Default::default() };
            assert!(Preferences::create(conn, p.id, &data).is_err());
            Ok(())
        })
        .unwrap();
    }
}
