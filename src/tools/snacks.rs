//! Snack MCP Tools

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{Snack, SnackCategory, SnackCreate, SnackFilter, SnackUpdate};

/// Response for list_snacks
#[derive(Debug, Serialize)]
pub struct ListSnacksResponse {
    pub snacks: Vec<Snack>,
    pub total: usize,
}

/// Response for delete_snack
#[derive(Debug, Serialize)]
pub struct DeleteSnackResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Parse an optional category label for filtering
pub fn parse_snack_category(label: Option<&str>) -> Result<Option<SnackCategory>, String> {
    match label {
        Some(l) => SnackCategory::from_str(l)
            .map(Some)
            .ok_or_else(|| format!("Unknown snack category: '{}'", l)),
        None => Ok(None),
    }
}

/// Create a snack
pub fn create_snack(db: &Database, data: SnackCreate) -> Result<Snack, String> {
    if data.name.trim().is_empty() {
        return Err("Snack name cannot be empty".to_string());
    }
    if [data.calories, data.proteins, data.carbohydrates, data.fats]
        .iter()
        .flatten()
        .any(|v| *v < 0.0)
    {
        return Err("Nutrient values cannot be negative".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let snack = Snack::create(&conn, &data)
        .map_err(|e| format!("Failed to create snack: {}", e))?;

    info!(snack_id = snack.id, "Created snack");

    Ok(snack)
}

/// List snacks matching every set filter
pub fn list_snacks(db: &Database, filter: SnackFilter) -> Result<ListSnacksResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let snacks = Snack::list(&conn, &filter)
        .map_err(|e| format!("Failed to list snacks: {}", e))?;
    let total = snacks.len();

    Ok(ListSnacksResponse { snacks, total })
}

/// Get a snack by ID
pub fn get_snack(db: &Database, id: i64) -> Result<Option<Snack>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Snack::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get snack: {}", e))
}

/// Update a snack
pub fn update_snack(db: &Database, id: i64, data: SnackUpdate) -> Result<Snack, String> {
    if matches!(data.name.as_deref(), Some(n) if n.trim().is_empty()) {
        return Err("Snack name cannot be empty".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Snack::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update snack: {}", e))?
        .ok_or_else(|| format!("Snack not found with id: {}", id))
}

/// Delete a snack
pub fn delete_snack(db: &Database, id: i64) -> Result<DeleteSnackResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Snack::delete(&conn, id)
        .map_err(|e| format!("Failed to delete snack: {}", e))?;
    if !deleted {
        return Err(format!("Snack not found with id: {}", id));
    }

    Ok(DeleteSnackResponse { success: true, deleted_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SnackFlags;

    fn snack(name: &str, category: SnackCategory, flags: SnackFlags) -> SnackCreate {
        SnackCreate {
            name: name.to_string(),
            category: Some(category),
            calories: Some(120.0),
            flags,
            ..Default::default()
        }
    }

    fn seed(db: &Database) {
        let vegan = SnackFlags {
            is_vegetarian: true,
            is_vegan: true,
            is_diabetic_friendly: true,
            is_low_sodium: true,
        };
        let vegetarian = SnackFlags {
            is_vegetarian: true,
            ..Default::default()
        };
        create_snack(db, snack("Apple with almonds", SnackCategory::Fruit, vegan)).unwrap();
        create_snack(db, snack("Cheese crackers", SnackCategory::Salty, vegetarian)).unwrap();
        create_snack(db, snack("Turkey roll", SnackCategory::Protein, SnackFlags::default())).unwrap();
    }

    #[test]
    fn test_filters_combine() {
        let db = Database::in_memory().unwrap();
        seed(&db);

        assert_eq!(list_snacks(&db, SnackFilter::default()).unwrap().total, 3);

        let vegetarian = SnackFilter { vegetarian: Some(true), ..Default::default() };
        assert_eq!(list_snacks(&db, vegetarian).unwrap().total, 2);

        let vegetarian_salty = SnackFilter {
            vegetarian: Some(true),
            category: parse_snack_category(Some("salado")).unwrap(),
            ..Default::default()
        };
        let found = list_snacks(&db, vegetarian_salty).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.snacks[0].name, "Cheese crackers");

        let diabetic = SnackFilter { diabetic_friendly: Some(true), low_sodium: Some(true), ..Default::default() };
        assert_eq!(list_snacks(&db, diabetic).unwrap().snacks[0].name, "Apple with almonds");
    }

    #[test]
    fn test_update_and_delete() {
        let db = Database::in_memory().unwrap();
        let created = create_snack(&db, snack("Turkey roll", SnackCategory::Protein, SnackFlags::default())).unwrap();

        let data = SnackUpdate { is_low_sodium: Some(true), ..Default::default() };
        let updated = update_snack(&db, created.id, data).unwrap();
        assert!(updated.flags.is_low_sodium);
        assert!(!updated.flags.is_vegan);

        delete_snack(&db, created.id).unwrap();
        assert!(get_snack(&db, created.id).unwrap().is_none());
        assert!(update_snack(&db, created.id, SnackUpdate::default()).is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        let db = Database::in_memory().unwrap();
        assert!(create_snack(&db, snack("", SnackCategory::Sweet, SnackFlags::default())).is_err());
        assert!(parse_snack_category(Some("spicy")).is_err());
        assert_eq!(parse_snack_category(None).unwrap(), None);
    }
}
