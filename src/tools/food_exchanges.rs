//! Food Exchange MCP Tools
//!
//! The exchange table: portions with known macros, interchangeable within a
//! category.

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::models::{ExchangeCategory, FoodExchange, FoodExchangeCreate, FoodExchangeUpdate};

/// Response for list_food_exchanges
#[derive(Debug, Serialize)]
pub struct ListFoodExchangesResponse {
    pub food_exchanges: Vec<FoodExchange>,
    pub total: usize,
}

/// Response for delete_food_exchange
#[derive(Debug, Serialize)]
pub struct DeleteFoodExchangeResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn check_non_negative(fields: &[(&str, Option<f64>)]) -> Result<(), String> {
    for (name, value) in fields {
        if matches!(value, Some(v) if *v < 0.0) {
            return Err(format!("{} cannot be negative", name));
        }
    }
    Ok(())
}

/// Add an entry to the exchange table
pub fn create_food_exchange(db: &Database, data: FoodExchangeCreate) -> Result<FoodExchange, String> {
    if data.name.trim().is_empty() || data.portion_size.trim().is_empty() {
        return Err("name and portion_size cannot be empty".to_string());
    }
    if data.portion_weight <= 0.0 {
        return Err("portion_weight must be greater than 0".to_string());
    }
    check_non_negative(&[
        ("calories", Some(data.calories)),
        ("proteins", Some(data.proteins)),
        ("carbohydrates", Some(data.carbohydrates)),
        ("fats", Some(data.fats)),
        ("fiber", data.fiber),
    ])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let exchange = FoodExchange::create(&conn, &data)
        .map_err(|e| format!("Failed to create food exchange: {}", e))?;

    info!(food_exchange_id = exchange.id, category = exchange.category.as_str(), "Created food exchange");

    Ok(exchange)
}

/// List the exchange table, optionally for one category
pub fn list_food_exchanges(db: &Database, category: Option<String>) -> Result<ListFoodExchangesResponse, String> {
    let category = match category.as_deref() {
        Some(label) => Some(
            ExchangeCategory::from_str(label)
                .ok_or_else(|| format!("Unknown exchange category: '{}'", label))?,
        ),
        None => None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let food_exchanges = FoodExchange::list(&conn, category)
        .map_err(|e| format!("Failed to list food exchanges: {}", e))?;
    let total = food_exchanges.len();

    Ok(ListFoodExchangesResponse { food_exchanges, total })
}

/// Get a food exchange by ID
pub fn get_food_exchange(db: &Database, id: i64) -> Result<Option<FoodExchange>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    FoodExchange::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get food exchange: {}", e))
}

/// Update a food exchange
pub fn update_food_exchange(db: &Database, id: i64, data: FoodExchangeUpdate) -> Result<FoodExchange, String> {
    if matches!(data.portion_weight, Some(w) if w <= 0.0) {
        return Err("portion_weight must be greater than 0".to_string());
    }
    check_non_negative(&[
        ("calories", data.calories),
        ("proteins", data.proteins),
        ("carbohydrates", data.carbohydrates),
        ("fats", data.fats),
        ("fiber", data.fiber),
    ])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    FoodExchange::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update food exchange: {}", e))?
        .ok_or_else(|| format!("Food exchange not found with id: {}", id))
}

/// Delete a food exchange
pub fn delete_food_exchange(db: &Database, id: i64) -> Result<DeleteFoodExchangeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = FoodExchange::delete(&conn, id)
        .map_err(|e| format!("Failed to delete food exchange: {}", e))?;
    if !deleted {
        return Err(format!("Food exchange not found with id: {}", id));
    }

    Ok(DeleteFoodExchangeResponse { success: true, deleted_id: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Micronutrients;

    fn exchange(name: &str, category: ExchangeCategory) -> FoodExchangeCreate {
        FoodExchangeCreate {
            name: name.to_string(),
            category,
            portion_size: "1 cup".to_string(),
            portion_weight: 150.0,
            calories: 70.0,
            proteins: 2.0,
            carbohydrates: 15.0,
            fats: 0.5,
            fiber: Some(2.0),
            micronutrients: Micronutrients::default(),
            notes: None,
            is_custom: false,
        }
    }

    #[test]
    fn test_create_and_filter_by_category() {
        let db = Database::in_memory().unwrap();
        create_food_exchange(&db, exchange("Cooked rice", ExchangeCategory::Cereals)).unwrap();
        create_food_exchange(&db, exchange("Apple", ExchangeCategory::Fruits)).unwrap();

        assert_eq!(list_food_exchanges(&db, None).unwrap().total, 2);

        let fruits = list_food_exchanges(&db, Some("frutas".to_string())).unwrap();
        assert_eq!(fruits.total, 1);
        assert_eq!(fruits.food_exchanges[0].name, "Apple");

        assert!(list_food_exchanges(&db, Some("snacks".to_string())).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let db = Database::in_memory().unwrap();
        let created = create_food_exchange(&db, exchange("Apple", ExchangeCategory::Fruits)).unwrap();

        let mut data = FoodExchangeUpdate {
            calories: Some(65.0),
            ..Default::default()
        };
        data.micronutrients.vitamin_c = Some(4.6);
        let updated = update_food_exchange(&db, created.id, data).unwrap();
        assert_eq!(updated.calories, 65.0);
        assert_eq!(updated.proteins, 2.0);
        assert_eq!(updated.micronutrients.vitamin_c, Some(4.6));

        delete_food_exchange(&db, created.id).unwrap();
        assert!(get_food_exchange(&db, created.id).unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let db = Database::in_memory().unwrap();
        let mut zero_weight = exchange("Apple", ExchangeCategory::Fruits);
        zero_weight.portion_weight = 0.0;
        assert!(create_food_exchange(&db, zero_weight).is_err());

        let mut negative = exchange("Apple", ExchangeCategory::Fruits);
        negative.fats = -1.0;
        assert!(create_food_exchange(&db, negative).is_err());
    }
}
