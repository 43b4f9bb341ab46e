//! Menu MCP Tools
//!
//! Reusable day menus grouped by category.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{Menu, MenuCategory, MenuCreate, MenuUpdate};

/// Response for list_menus
#[derive(Debug, Serialize)]
pub struct ListMenusResponse {
    pub menus: Vec<Menu>,
    pub total: usize,
}

/// Response for delete_menu
#[derive(Debug, Serialize)]
pub struct DeleteMenuResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_nutrients(values: &[Option<f64>]) -> Result<(), String> {
    if values.iter().flatten().any(|v| *v < 0.0) {
        return Err("Nutrient values cannot be negative".to_string());
    }
    Ok(())
}

/// Create a menu
pub fn create_menu(db: &Database, data: MenuCreate) -> Result<Menu, String> {
    if data.name.trim().is_empty() {
        return Err("Menu name cannot be empty".to_string());
    }
    validate_nutrients(&[data.calories, data.proteins, data.carbohydrates, data.fats, data.fiber])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let menu = Menu::create(&conn, &data)
        .map_err(|e| format!("Failed to create menu: {}", e))?;

    info!(menu_id = menu.id, category = menu.category.as_str(), "Created menu");

    Ok(menu)
}

/// List menus, optionally filtered by category
pub fn list_menus(db: &Database, category: Option<String>) -> Result<ListMenusResponse, String> {
    let category = match category.as_deref() {
        Some(label) => {
            let parsed = MenuCategory::from_str(label);
            if parsed == MenuCategory::Other && label.trim().to_lowercase() != "other" {
                return Err(format!("Unknown menu category: '{}'", label));
            }
            Some(parsed)
        }
        None => None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let menus = Menu::list(&conn, category)
        .map_err(|e| format!("Failed to list menus: {}", e))?;
    let total = menus.len();

    Ok(ListMenusResponse { menus, total })
}

/// Get a menu by ID
pub fn get_menu(db: &Database, id: i64) -> Result<Option<Menu>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Menu::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get menu: {}", e))
}

/// Update a menu
pub fn update_menu(db: &Database, id: i64, data: MenuUpdate) -> Result<Menu, String> {
    if matches!(data.name.as_deref(), Some(n) if n.trim().is_empty()) {
        return Err("Menu name cannot be empty".to_string());
    }
    validate_nutrients(&[data.calories, data.proteins, data.carbohydrates, data.fats, data.fiber])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Menu::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update menu: {}", e))?
        .ok_or_else(|| format!("Menu not found with id: {}", id))
}

/// Delete a menu
pub fn delete_menu(db: &Database, id: i64) -> Result<DeleteMenuResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Menu::delete(&conn, id)
        .map_err(|e| format!("Failed to delete menu: {}", e))?;
    if !deleted {
        return Err(format!("Menu not found with id: {}", id));
    }

    Ok(DeleteMenuResponse { success: true, deleted_id: id })
}
