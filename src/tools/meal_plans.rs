//! Meal Plan MCP Tools
//!
//! Tools for building per-patient meal plans. Plan totals are always the sum
//! of the item macros.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{parse_date, Macros, MealPlan, MealPlanCreate, MealPlanDetail, Patient};

use super::patients::load_owned_patient;

/// Summary of a meal plan for list results
#[derive(Debug, Serialize)]
pub struct MealPlanSummary {
    pub id: i64,
    pub date_created: String,
    pub name: Option<String>,
    pub totals: Macros,
}

/// Response for list_meal_plans
#[derive(Debug, Serialize)]
pub struct ListMealPlansResponse {
    pub patient_id: i64,
    pub meal_plans: Vec<MealPlanSummary>,
    pub total: usize,
}

/// Response for delete_meal_plan
#[derive(Debug, Serialize)]
pub struct DeleteMealPlanResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_plan(data: &mut MealPlanCreate) -> Result<(), String> {
    if let Some(date) = data.date_created.as_deref() {
        let parsed = parse_date(date)
            .ok_or_else(|| format!("Invalid date_created '{}', expected YYYY-MM-DD", date))?;
        data.date_created = Some(parsed.format("%Y-%m-%d").to_string());
    }

    for (i, item) in data.items.iter().enumerate() {
        if item.meal_time.trim().is_empty() || item.food_item.trim().is_empty() {
            return Err(format!("Item {} needs a meal_time and a food_item", i + 1));
        }
        let m = &item.macros;
        if m.calories < 0.0 || m.proteins < 0.0 || m.carbohydrates < 0.0 || m.fats < 0.0 {
            return Err(format!("Item {} has negative macros", i + 1));
        }
    }
    Ok(())
}

/// Create a meal plan with its items for an owned patient
pub fn create_meal_plan(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    mut data: MealPlanCreate,
) -> Result<MealPlanDetail, String> {
    validate_plan(&mut data)?;

    let detail = db
        .with_transaction(|tx| {
            if Patient::get_owned(tx, patient_id, nutritionist_id)?.is_none() {
                return Ok(None);
            }
            MealPlan::create(tx, patient_id, &data).map(Some)
        })
        .map_err(|e| format!("Failed to create meal plan: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    info!(
        meal_plan_id = detail.plan.id,
        patient_id,
        items = detail.items.len(),
        calories = detail.plan.totals.calories,
        "Created meal plan"
    );

    Ok(detail)
}

/// List a patient's meal plans, newest first
pub fn list_meal_plans(db: &Database, nutritionist_id: i64, patient_id: i64) -> Result<ListMealPlansResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let plans = MealPlan::list_for_patient(&conn, patient_id)
        .map_err(|e| format!("Failed to list meal plans: {}", e))?;

    let summaries: Vec<MealPlanSummary> = plans
        .into_iter()
        .map(|p| MealPlanSummary {
            id: p.id,
            date_created: p.date_created,
            name: p.name,
            totals: p.totals,
        })
        .collect();
    let total = summaries.len();

    Ok(ListMealPlansResponse {
        patient_id,
        meal_plans: summaries,
        total,
    })
}

/// Get a meal plan with its items
pub fn get_meal_plan(db: &Database, nutritionist_id: i64, id: i64) -> Result<Option<MealPlanDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if MealPlan::get_owned(&conn, id, nutritionist_id)
        .map_err(|e| format!("Failed to get meal plan: {}", e))?
        .is_none()
    {
        return Ok(None);
    }

    MealPlan::get_detail(&conn, id).map_err(|e| format!("Failed to get meal plan: {}", e))
}

/// Replace a meal plan's header and items; totals are recomputed
pub fn replace_meal_plan(
    db: &Database,
    nutritionist_id: i64,
    id: i64,
    mut data: MealPlanCreate,
) -> Result<MealPlanDetail, String> {
    validate_plan(&mut data)?;

    let detail = db
        .with_transaction(|tx| {
            if MealPlan::get_owned(tx, id, nutritionist_id)?.is_none() {
                return Ok(None);
            }
            MealPlan::replace(tx, id, &data)
        })
        .map_err(|e| format!("Failed to update meal plan: {}", e))?
        .ok_or_else(|| format!("Meal plan not found with id: {}", id))?;

    info!(meal_plan_id = id, items = detail.items.len(), "Replaced meal plan");

    Ok(detail)
}

/// Delete a meal plan and its items
pub fn delete_meal_plan(db: &Database, nutritionist_id: i64, id: i64) -> Result<DeleteMealPlanResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = MealPlan::get_owned(&conn, id, nutritionist_id)
        .map_err(|e| format!("Database error: {}", e))?;
    if existing.is_none() {
        return Err(format!("Meal plan not found with id: {}", id));
    }

    MealPlan::delete(&conn, id)
        .map_err(|e| format!("Failed to delete meal plan: {}", e))?;

    Ok(DeleteMealPlanResponse { success: true, deleted_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{nutritionist, patient_data};
    use crate::models::MealPlanItemCreate;

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let (nid, pid) = db
            .with_conn(|conn| {
                let n = nutritionist(conn, "a@test.com")?;
                let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
                Ok((n.id, p.id))
            })
            .unwrap();
        (db, nid, pid)
    }

    fn item(meal_time: &str, food: &str, calories: f64, proteins: f64) -> MealPlanItemCreate {
        MealPlanItemCreate {
            meal_time: meal_time.to_string(),
            food_item: food.to_string(),
            portion: "1 portion".to_string(),
            macros: Macros {
                calories,
                proteins,
                carbohydrates: 10.0,
                fats: 2.5,
            },
        }
    }

    fn plan(items: Vec<MealPlanItemCreate>) -> MealPlanCreate {
        MealPlanCreate {
            date_created: Some("2025-03-01".to_string()),
            name: Some("Week 1".to_string()),
            notes: None,
            items,
        }
    }

    #[test]
    fn test_totals_follow_items_on_create_and_replace() {
        let (db, nid, pid) = setup();

        let created = create_meal_plan(
            &db,
            nid,
            pid,
            plan(vec![item("breakfast", "Oatmeal", 150.0, 5.0), item("lunch", "Chicken", 320.5, 30.0)]),
        )
        .unwrap();
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.plan.totals.calories, 470.5);
        assert_eq!(created.plan.totals.proteins, 35.0);
        assert_eq!(created.plan.totals.carbohydrates, 20.0);
        assert_eq!(created.plan.totals.fats, 5.0);

        let replaced = replace_meal_plan(&db, nid, created.plan.id, plan(vec![item("dinner", "Soup", 200.0, 8.0)])).unwrap();
        assert_eq!(replaced.items.len(), 1);
        assert_eq!(replaced.plan.totals.calories, 200.0);
        assert_eq!(replaced.plan.totals.fats, 2.5);

        let listed = list_meal_plans(&db, nid, pid).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.meal_plans[0].totals.calories, 200.0);
    }

    #[test]
    fn test_empty_plan_has_zero_totals() {
        let (db, nid, pid) = setup();
        let created = create_meal_plan(&db, nid, pid, plan(vec![])).unwrap();
        assert_eq!(created.plan.totals, Macros::zero());
        assert_eq!(created.plan.date_created, "2025-03-01");
    }

    #[test]
    fn test_rejects_bad_input() {
        let (db, nid, pid) = setup();
        let mut bad_date = plan(vec![]);
        bad_date.date_created = Some("March 1st".to_string());
        assert!(create_meal_plan(&db, nid, pid, bad_date).is_err());

        assert!(create_meal_plan(&db, nid, pid, plan(vec![item("", "Oatmeal", 150.0, 5.0)])).is_err());
        assert!(create_meal_plan(&db, nid, pid, plan(vec![item("lunch", "Oatmeal", -1.0, 5.0)])).is_err());
    }

    #[test]
    fn test_foreign_and_deleted_plans() {
        let (db, nid, pid) = setup();
        let other = db.with_conn(|conn| nutritionist(conn, "b@test.com")).unwrap().id;
        let created = create_meal_plan(&db, nid, pid, plan(vec![item("lunch", "Rice", 200.0, 4.0)])).unwrap();

        assert!(create_meal_plan(&db, other, pid, plan(vec![])).is_err());
        assert!(get_meal_plan(&db, other, created.plan.id).unwrap().is_none());
        assert!(delete_meal_plan(&db, other, created.plan.id).is_err());

        delete_meal_plan(&db, nid, created.plan.id).unwrap();
        assert!(get_meal_plan(&db, nid, created.plan.id).unwrap().is_none());
        assert!(replace_meal_plan(&db, nid, created.plan.id, plan(vec![])).is_err());
    }
}
