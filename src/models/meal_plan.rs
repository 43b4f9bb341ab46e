//! Meal plan model
//!
//! A named plan for one patient, made of meal-time items. The plan's totals
//! are cached and always equal the sum over its items.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::Macros;

/// A meal plan header with cached totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub patient_id: i64,
    pub date_created: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub totals: Macros,
    pub created_at: String,
    pub updated_at: String,
}

/// One food at one meal time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanItem {
    pub id: i64,
    pub meal_plan_id: i64,
    pub meal_time: String,
    pub food_item: String,
    pub portion: String,
    #[serde(flatten)]
    pub macros: Macros,
}

/// Data for one item of a new or replaced plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealPlanItemCreate {
    pub meal_time: String,
    pub food_item: String,
    pub portion: String,
    #[serde(flatten)]
    pub macros: Macros,
}

/// Data for creating or replacing a meal plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealPlanCreate {
    /// Defaults to today when absent
    pub date_created: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<MealPlanItemCreate>,
}

/// A meal plan with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealPlanDetail {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub items: Vec<MealPlanItem>,
}

impl MealPlanCreate {
    /// Totals over the items
    pub fn totals(&self) -> Macros {
        self.items.iter().map(|i| i.macros).sum::<Macros>().rounded()
    }
}

impl MealPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            date_created: row.get("date_created")?,
            name: row.get("name")?,
            notes: row.get("notes")?,
            totals: Macros {
                calories: row.get("total_calories")?,
                proteins: row.get("total_proteins")?,
                carbohydrates: row.get("total_carbohydrates")?,
                fats: row.get("total_fats")?,
            },
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a plan and its items. Run inside a transaction.
    pub fn create(conn: &Connection, patient_id: i64, data: &MealPlanCreate) -> DbResult<MealPlanDetail> {
        let totals = data.totals();
        conn.execute(
            r#"
            INSERT INTO meal_plans (
                patient_id, date_created, name, notes,
                total_calories, total_proteins, total_carbohydrates, total_fats
            ) VALUES (?1, COALESCE(?2, date('now')), ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                patient_id,
                data.date_created,
                data.name,
                data.notes,
                totals.calories,
                totals.proteins,
                totals.carbohydrates,
                totals.fats,
            ],
        )?;

        let id = conn.last_insert_rowid();
        MealPlanItem::insert_all(conn, id, &data.items)?;

        Self::get_detail(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a plan header by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_plans WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a plan only if its patient belongs to `nutritionist_id`
    pub fn get_owned(conn: &Connection, id: i64, nutritionist_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.* FROM meal_plans m
            INNER JOIN patients p ON p.id = m.patient_id
            WHERE m.id = ?1 AND p.nutritionist_id = ?2
            "#
        )?;

        let result = stmt.query_row(params![id, nutritionist_id], Self::from_row);
        match result {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a plan together with its items
    pub fn get_detail(conn: &Connection, id: i64) -> DbResult<Option<MealPlanDetail>> {
        let Some(plan) = Self::get_by_id(conn, id)? else {
            return Ok(None);
        };
        let items = MealPlanItem::list_for_plan(conn, id)?;
        Ok(Some(MealPlanDetail { plan, items }))
    }

    /// Plans of one patient, newest first
    pub fn list_for_patient(conn: &Connection, patient_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_plans WHERE patient_id = ?1 ORDER BY date_created DESC, id DESC"
        )?;

        let plans = stmt
            .query_map([patient_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plans)
    }

    /// Replace header fields and the whole item list. Run inside a transaction.
    pub fn replace(conn: &Connection, id: i64, data: &MealPlanCreate) -> DbResult<Option<MealPlanDetail>> {
        let totals = data.totals();
        let rows = conn.execute(
            r#"
            UPDATE meal_plans SET
                date_created = COALESCE(?1, date_created),
                name = ?2,
                notes = ?3,
                total_calories = ?4,
                total_proteins = ?5,
                total_carbohydrates = ?6,
                total_fats = ?7,
                updated_at = datetime('now')
            WHERE id = ?8
            "#,
            params![
                data.date_created,
                data.name,
                data.notes,
                totals.calories,
                totals.proteins,
                totals.carbohydrates,
                totals.fats,
                id,
            ],
        )?;

        if rows == 0 {
            return Ok(None);
        }

        conn.execute("DELETE FROM meal_plan_items WHERE meal_plan_id = ?1", [id])?;
        MealPlanItem::insert_all(conn, id, &data.items)?;

        Self::get_detail(conn, id)
    }

    /// Delete a plan; its items cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_plans WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

impl MealPlanItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            meal_plan_id: row.get("meal_plan_id")?,
            meal_time: row.get("meal_time")?,
            food_item: row.get("food_item")?,
            portion: row.get("portion")?,
            macros: Macros {
                calories: row.get("calories")?,
                proteins: row.get("proteins")?,
                carbohydrates: row.get("carbohydrates")?,
                fats: row.get("fats")?,
            },
        })
    }

    fn insert_all(conn: &Connection, meal_plan_id: i64, items: &[MealPlanItemCreate]) -> DbResult<()> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO meal_plan_items (
                meal_plan_id, meal_time, food_item, portion, calories, proteins, carbohydrates, fats
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#
        )?;

        for item in items {
            stmt.execute(params![
                meal_plan_id,
                item.meal_time,
                item.food_item,
                item.portion,
                item.macros.calories,
                item.macros.proteins,
                item.macros.carbohydrates,
                item.macros.fats,
            ])?;
        }

        Ok(())
    }

    /// Items of one plan in insertion order
    pub fn list_for_plan(conn: &Connection, meal_plan_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM meal_plan_items WHERE meal_plan_id = ?1 ORDER BY id ASC"
        )?;

        let items = stmt
            .query_map([meal_plan_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::test_support::{nutritionist, patient_data};
    use crate::models::Patient;

    fn item(meal_time: &str, calories: f64, proteins: f64) -> MealPlanItemCreate {
        MealPlanItemCreate {
            meal_time: meal_time.to_string(),
            food_item: "Avena".to_string(),
            portion: "1 taza".to_string(),
            macros: Macros { calories, proteins, carbohydrates: 20.0, fats: 3.0 },
        }
    }

    fn plan(items: Vec<MealPlanItemCreate>) -> MealPlanCreate {
        MealPlanCreate {
            date_created: Some("2025-02-01".to_string()),
            name: Some("Semana 1".to_string()),
            notes: None,
            items,
        }
    }

    #[test]
    fn test_create_totals_equal_item_sums() {
        let db = Database::in_memory().unwrap();
        let detail = db
            .with_transaction(|tx| {
                let n = nutritionist(tx, "a@test.com")?;
                let p = Patient::create(tx, n.id, &patient_data("P-001"))?;
                MealPlan::create(tx, p.id, &plan(vec![item("breakfast", 300.0, 12.0), item("lunch", 550.5, 30.0)]))
            })
            .unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.plan.totals.calories, 850.5);
        assert_eq!(detail.plan.totals.proteins, 42.0);
        assert_eq!(detail.plan.totals.carbohydrates, 40.0);
        assert_eq!(detail.plan.totals.fats, 6.0);
    }

    #[test]
    fn test_replace_recomputes_totals() {
        let db = Database::in_memory().unwrap();
        let detail = db
            .with_transaction(|tx| {
                let n = nutritionist(tx, "a@test.com")?;
                let p = Patient::create(tx, n.id, &patient_data("P-001"))?;
                let created = MealPlan::create(tx, p.id, &plan(vec![item("breakfast", 300.0, 12.0)]))?;
                MealPlan::replace(
                    tx,
                    created.plan.id,
                    &plan(vec![item("dinner", 100.0, 5.0), item("snack", 50.0, 1.0), item("lunch", 10.0, 0.5)]),
                )
            })
            .unwrap()
            .unwrap();

        assert_eq!(detail.items.len(), 3);
        assert_eq!(detail.items[0].meal_time, "dinner");
        assert_eq!(detail.plan.totals.calories, 160.0);
        assert_eq!(detail.plan.totals.proteins, 6.5);
    }

    #[test]
    fn test_replace_missing_plan() {
        let db = Database::in_memory().unwrap();
        let result = db.with_transaction(|tx| MealPlan::replace(tx, 999, &plan(vec![]))).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_cascades_items() {
        let db = Database::in_memory().unwrap();
        db.with_transaction(|tx| {
            let n = nutritionist(tx, "a@test.com")?;
            let p = Patient::create(tx, n.id, &patient_data("P-001"))?;
            let created = MealPlan::create(tx, p.id, &plan(vec![item("breakfast", 300.0, 12.0)]))?;

            assert!(MealPlan::delete(tx, created.plan.id)?);
            assert!(MealPlanItem::list_for_plan(tx, created.plan.id)?.is_empty());
            assert!(!MealPlan::delete(tx, created.plan.id)?);
            Ok(())
        })
        .unwrap();
    }
}
