//! Patient Preference MCP Tools
//!
//! Food likes and habits per patient, and the rule-based suggestions built
//! from them.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{
    BudgetLevel, CookingTime, Patient, Preferences, PreferencesCreate, PreferencesUpdate,
    TASTE_SCORE_RANGE,
};

use super::patients::load_owned_patient;

/// Taste score at or above which a flavor counts as liked
pub const LIKED_TASTE_SCORE: i32 = 4;

/// One group of suggestions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: String,
    pub title: String,
    pub items: Vec<String>,
}

impl Recommendation {
    fn new(category: &str, title: impl Into<String>, items: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            title: title.into(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Response for patient_recommendations
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub patient_id: i64,
    pub patient_name: String,
    pub preferences_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub recommendations: Vec<Recommendation>,
}

/// Response for delete_preferences
#[derive(Debug, Serialize)]
pub struct DeletePreferencesResponse {
    pub success: bool,
    pub patient_id: i64,
}

fn validate_scores(scores: &[(&'static str, i32)], snacks_per_day: Option<i32>) -> Result<(), String> {
    for (name, score) in scores {
        if !TASTE_SCORE_RANGE.contains(score) {
            return Err(format!(
                "{} must be between {} and {}, got {}",
                name,
                TASTE_SCORE_RANGE.start(),
                TASTE_SCORE_RANGE.end(),
                score
            ));
        }
    }
    if matches!(snacks_per_day, Some(n) if n < 0) {
        return Err("snacks_per_day cannot be negative".to_string());
    }
    Ok(())
}

/// Record preferences for an owned patient. A patient holds at most one set.
pub fn create_preferences(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    data: PreferencesCreate,
) -> Result<Preferences, String> {
    validate_scores(&data.taste_scores(), Some(data.snacks_per_day))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let existing = Preferences::get_for_patient(&conn, patient_id)
        .map_err(|e| format!("Database error: {}", e))?;
    if existing.is_some() {
        return Err(format!(
            "Patient {} already has preferences; update them instead",
            patient_id
        ));
    }

    let preferences = Preferences::create(&conn, patient_id, &data)
        .map_err(|e| format!("Failed to create preferences: {}", e))?;

    info!(patient_id, "Recorded patient preferences");

    Ok(preferences)
}

/// Get the preferences of an owned patient
pub fn get_preferences(db: &Database, nutritionist_id: i64, patient_id: i64) -> Result<Option<Preferences>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    Preferences::get_for_patient(&conn, patient_id)
        .map_err(|e| format!("Failed to get preferences: {}", e))
}

/// Update preferences; only provided fields change
pub fn update_preferences(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    data: PreferencesUpdate,
) -> Result<Preferences, String> {
    validate_scores(&data.taste_scores(), data.snacks_per_day)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    Preferences::update(&conn, patient_id, &data)
        .map_err(|e| format!("Failed to update preferences: {}", e))?
        .ok_or_else(|| format!("Preferences not found for patient: {}", patient_id))
}

/// Delete the preferences of an owned patient
pub fn delete_preferences(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
) -> Result<DeletePreferencesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let deleted = Preferences::delete(&conn, patient_id)
        .map_err(|e| format!("Failed to delete preferences: {}", e))?;
    if !deleted {
        return Err(format!("Preferences not found for patient: {}", patient_id));
    }

    Ok(DeletePreferencesResponse { success: true, patient_id })
}

/// Suggestions derived from preferences and the patient's conditions
pub fn build_recommendations(patient: &Patient, prefs: &Preferences) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if prefs.budget_level == BudgetLevel::Low {
        out.push(Recommendation::new(
            "Budget",
            "Affordable, nutritious foods",
            &[
                "Beans and lentils (inexpensive protein)",
                "Eggs (high-quality protein)",
                "Oats (healthy carbohydrate)",
                "Green plantain (versatile and cheap)",
                "Carrot and squash (inexpensive vitamins)",
            ],
        ));
    }

    if prefs.cooking_time_available == CookingTime::Little {
        out.push(Recommendation::new(
            "Preparation time",
            "Quick options (<15 min)",
            &[
                "Scrambled eggs with vegetables",
                "Tuna salad with avocado",
                "Fruit smoothie with oats",
                "Arepa with cheese and avocado",
                "Yogurt with fruit and granola",
            ],
        ));
    }

    if prefs.sweet_preference >= LIKED_TASTE_SCORE {
        out.push(Recommendation::new(
            "Sweet flavors",
            "Healthy sweet options",
            &[
                "Soursop shake",
                "Guava paste with cheese",
                "Fruit: mango, papaya, pineapple",
                "Oatmeal with cinnamon",
                "Passion fruit and banana smoothie",
            ],
        ));
    }

    if prefs.salty_preference >= LIKED_TASTE_SCORE {
        out.push(Recommendation::new(
            "Salty flavors",
            "Healthy salty snacks",
            &[
                "Roasted unsalted peanuts",
                "Fresh farmer's cheese",
                "Carrot sticks with hummus",
                "Baked plantain chips",
                "Pork crackling (in moderation)",
            ],
        ));
    }

    if prefs.prefers_cooking_method("boiled") || prefs.prefers_cooking_method("hervido") {
        out.push(Recommendation::new(
            "Cooking methods",
            "Healthy boiled recipes",
            &[
                "Chicken and vegetable stew",
                "Steamed fish",
                "Corn porridge",
                "Chicken and potato soup",
                "Beef rib broth with potatoes",
            ],
        ));
    }

    if let Some(allergies) = prefs.allergies.as_deref().filter(|a| !a.trim().is_empty()) {
        out.push(Recommendation::new(
            "Allergies",
            format!("Avoid: {}", allergies.trim()),
            &[
                "Always read food labels",
                "Ask your nutritionist for alternatives",
                "Mention your allergies when eating out",
            ],
        ));
    }

    if patient.has_diabetes {
        out.push(Recommendation::new(
            "Diabetes",
            "Recommended foods",
            &[
                "Whole grains (low glycemic index)",
                "Avocado (healthy fats)",
                "Lean proteins (fish, chicken)",
                "Non-starchy vegetables",
                "Controlled fruit portions",
            ],
        ));
    }

    if patient.has_hypertension {
        out.push(Recommendation::new(
            "Hypertension",
            "Low-sodium foods",
            &[
                "Fresh fruit (natural potassium)",
                "Vegetables without added salt",
                "Herbs instead of salt",
                "Baked or steamed fish",
                "Avoid aged and salty cheeses",
            ],
        ));
    }

    out
}

/// Rule-based suggestions for an owned patient
pub fn patient_recommendations(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
) -> Result<RecommendationsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let patient = load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let prefs = Preferences::get_for_patient(&conn, patient_id)
        .map_err(|e| format!("Failed to get preferences: {}", e))?;

    let Some(prefs) = prefs else {
        return Ok(RecommendationsResponse {
            patient_id,
            patient_name: patient.full_name(),
            preferences_configured: false,
            message: Some("No preferences recorded for this patient".to_string()),
            recommendations: Vec::new(),
        });
    };

    Ok(RecommendationsResponse {
        patient_id,
        patient_name: patient.full_name(),
        preferences_configured: true,
        message: None,
        recommendations: build_recommendations(&patient, &prefs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{nutritionist, patient_data};

    fn setup(has_diabetes: bool) -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let (nid, pid) = db
            .with_conn(|conn| {
                let n = nutritionist(conn, "a@test.com")?;
                let mut data = patient_data("P-001");
                data.has_diabetes = has_diabetes;
                let p = Patient::create(conn, n.id, &data)?;
                Ok((n.id, p.id))
            })
            .unwrap();
        (db, nid, pid)
    }

    fn categories(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.category.as_str()).collect()
    }

    #[test]
    fn test_second_create_fails() {
        let (db, nid, pid) = setup(false);
        create_preferences(&db, nid, pid, PreferencesCreate::default()).unwrap();

        let err = create_preferences(&db, nid, pid, PreferencesCreate::default()).unwrap_err();
        assert!(err.contains("already has preferences"));
    }

    #[test]
    fn test_taste_scores_validated() {
        let (db, nid, pid) = setup(false);
        let data = PreferencesCreate { sweet_preference: 6, ..Default::default() };
        assert!(create_preferences(&db, nid, pid, data).is_err());

        create_preferences(&db, nid, pid, PreferencesCreate::default()).unwrap();
        let update = PreferencesUpdate { bitter_preference: Some(0), ..Default::default() };
        assert!(update_preferences(&db, nid, pid, update).is_err());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let (db, nid, pid) = setup(false);
        let data = PreferencesCreate {
            favorite_foods: Some("mango, rice".to_string()),
            ..Default::default()
        };
        create_preferences(&db, nid, pid, data).unwrap();

        let update = PreferencesUpdate { salty_preference: Some(5), ..Default::default() };
        let updated = update_preferences(&db, nid, pid, update).unwrap();
        assert_eq!(updated.salty_preference, 5);
        assert_eq!(updated.sweet_preference, 3);
        assert_eq!(updated.favorite_foods.as_deref(), Some("mango, rice"));
    }

    #[test]
    fn test_recommendations_without_preferences() {
        let (db, nid, pid) = setup(true);
        let response = patient_recommendations(&db, nid, pid).unwrap();
        assert!(!response.preferences_configured);
        assert!(response.message.is_some());
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn test_recommendations_follow_rules() {
        let (db, nid, pid) = setup(true);
        let data = PreferencesCreate {
            budget_level: BudgetLevel::Low,
            cooking_time_available: CookingTime::Little,
            sweet_preference: 4,
            salty_preference: 2,
            cooking_methods: Some("Hervido, al horno".to_string()),
            allergies: Some("peanuts".to_string()),
            ..Default::default()
        };
        create_preferences(&db, nid, pid, data).unwrap();

        let response = patient_recommendations(&db, nid, pid).unwrap();
        assert!(response.preferences_configured);
        assert_eq!(
            categories(&response.recommendations),
            vec!["Budget", "Preparation time", "Sweet flavors", "Cooking methods", "Allergies", "Diabetes"]
        );
        assert_eq!(response.recommendations[4].title, "Avoid: peanuts");
    }

    #[test]
    fn test_default_preferences_yield_no_blocks() {
        let (db, nid, pid) = setup(false);
        create_preferences(&db, nid, pid, PreferencesCreate::default()).unwrap();
        assert!(patient_recommendations(&db, nid, pid).unwrap().recommendations.is_empty());
    }

    #[test]
    fn test_foreign_patient_and_delete() {
        let (db, nid, pid) = setup(false);
        let other = db.with_conn(|conn| nutritionist(conn, "b@test.com")).unwrap().id;
        create_preferences(&db, nid, pid, PreferencesCreate::default()).unwrap();

        assert!(get_preferences(&db, other, pid).is_err());
        assert!(patient_recommendations(&db, other, pid).is_err());

        delete_preferences(&db, nid, pid).unwrap();
        assert!(get_preferences(&db, nid, pid).unwrap().is_none());
        assert!(delete_preferences(&db, nid, pid).is_err());
    }
}
