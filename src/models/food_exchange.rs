//! Food exchange model
//!
//! Portions of food with known macros, interchangeable within a category.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Exchange group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeCategory {
    Cereals,
    Legumes,
    Vegetables,
    Fruits,
    Meat,
    Dairy,
    Fats,
    Sugars,
}

impl ExchangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeCategory::Cereals => "cereals",
            ExchangeCategory::Legumes => "legumes",
            ExchangeCategory::Vegetables => "vegetables",
            ExchangeCategory::Fruits => "fruits",
            ExchangeCategory::Meat => "meat",
            ExchangeCategory::Dairy => "dairy",
            ExchangeCategory::Fats => "fats",
            ExchangeCategory::Sugars => "sugars",
        }
    }

    /// Parse a category label; unknown labels are rejected
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cereals" | "cereales" => Some(ExchangeCategory::Cereals),
            "legumes" | "leguminosas" => Some(ExchangeCategory::Legumes),
            "vegetables" | "verduras" => Some(ExchangeCategory::Vegetables),
            "fruits" | "frutas" => Some(ExchangeCategory::Fruits),
            "meat" | "carnes" => Some(ExchangeCategory::Meat),
            "dairy" | "lacteos" => Some(ExchangeCategory::Dairy),
            "fats" | "grasas" => Some(ExchangeCategory::Fats),
            "sugars" | "azucares" => Some(ExchangeCategory::Sugars),
            _ => None,
        }
    }
}

/// Micronutrients per portion
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Micronutrients {
    pub calcium: Option<f64>,   // mg
    pub iron: Option<f64>,      // mg
    pub sodium: Option<f64>,    // mg
    pub potassium: Option<f64>, // mg
    pub vitamin_a: Option<f64>, // mcg
    pub vitamin_c: Option<f64>, // mg
}

/// A food exchange entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodExchange {
    pub id: i64,
    pub name: String,
    pub category: ExchangeCategory,
    pub portion_size: String,
    pub portion_weight: f64,
    pub calories: f64,
    pub proteins: f64,
    pub carbohydrates: f64,
    pub fats: f64,
    pub fiber: Option<f64>,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
    pub notes: Option<String>,
    pub is_custom: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a food exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodExchangeCreate {
    pub name: String,
    pub category: ExchangeCategory,
    pub portion_size: String,
    pub portion_weight: f64,
    pub calories: f64,
    pub proteins: f64,
    pub carbohydrates: f64,
    pub fats: f64,
    pub fiber: Option<f64>,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// Data for updating a food exchange
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodExchangeUpdate {
    pub name: Option<String>,
    pub category: Option<ExchangeCategory>,
    pub portion_size: Option<String>,
    pub portion_weight: Option<f64>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
    pub notes: Option<String>,
    pub is_custom: Option<bool>,
}

impl FoodExchange {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let category: String = row.get("category")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: ExchangeCategory::from_str(&category).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    format!("category '{}'", category),
                    rusqlite::types::Type::Text,
                )
            })?,
            portion_size: row.get("portion_size")?,
            portion_weight: row.get("portion_weight")?,
            calories: row.get("calories")?,
            proteins: row.get("proteins")?,
            carbohydrates: row.get("carbohydrates")?,
            fats: row.get("fats")?,
            fiber: row.get("fiber")?,
            micronutrients: Micronutrients {
                calcium: row.get("calcium")?,
                iron: row.get("iron")?,
                sodium: row.get("sodium")?,
                potassium: row.get("potassium")?,
                vitamin_a: row.get("vitamin_a")?,
                vitamin_c: row.get("vitamin_c")?,
            },
            notes: row.get("notes")?,
            is_custom: row.get("is_custom")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new food exchange
    pub fn create(conn: &Connection, data: &FoodExchangeCreate) -> DbResult<Self> {
        let m = &data.micronutrients;
        conn.execute(
            r#"
            INSERT INTO food_exchanges (
                name, category, portion_size, portion_weight,
                calories, proteins, carbohydrates, fats, fiber,
                calcium, iron, sodium, potassium, vitamin_a, vitamin_c,
                notes, is_custom
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                data.name,
                data.category.as_str(),
                data.portion_size,
                data.portion_weight,
                data.calories,
                data.proteins,
                data.carbohydrates,
                data.fats,
                data.fiber,
                m.calcium,
                m.iron,
                m.sodium,
                m.potassium,
                m.vitamin_a,
                m.vitamin_c,
                data.notes,
                data.is_custom,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food exchange by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_exchanges WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List exchanges, optionally restricted to one category
    pub fn list(conn: &Connection, category: Option<ExchangeCategory>) -> DbResult<Vec<Self>> {
        let items = if let Some(cat) = category {
            let mut stmt = conn.prepare(
                "SELECT * FROM food_exchanges WHERE category = ?1 ORDER BY name ASC"
            )?;
            let rows = stmt.query_map([cat.as_str()], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare("SELECT * FROM food_exchanges ORDER BY category ASC, name ASC")?;
            let rows = stmt.query_map([], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        Ok(items)
    }

    /// Update a food exchange
    pub fn update(conn: &Connection, id: i64, data: &FoodExchangeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($value:expr, $col:expr) => {
                if let Some(ref val) = $value {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(data.name, "name");
        add_update!(data.category.map(|c| c.as_str()), "category");
        add_update!(data.portion_size, "portion_size");
        add_update!(data.portion_weight, "portion_weight");
        add_update!(data.calories, "calories");
        add_update!(data.proteins, "proteins");
        add_update!(data.carbohydrates, "carbohydrates");
        add_update!(data.fats, "fats");
        add_update!(data.fiber, "fiber");
        add_update!(data.micronutrients.calcium, "calcium");
        add_update!(data.micronutrients.iron, "iron");
        add_update!(data.micronutrients.sodium, "sodium");
        add_update!(data.micronutrients.potassium, "potassium");
        add_update!(data.micronutrients.vitamin_a, "vitamin_a");
        add_update!(data.micronutrients.vitamin_c, "vitamin_c");
        add_update!(data.notes, "notes");
        add_update!(data.is_custom, "is_custom");

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE food_exchanges SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a food exchange
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM food_exchanges WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn exchange(name: &str, category: ExchangeCategory) -> FoodExchangeCreate {
        FoodExchangeCreate {
            name: name.to_string(),
            category,
            portion_size: "1 pieza".to_string(),
            portion_weight: 120.0,
            calories: 60.0,
            proteins: 0.0,
            carbohydrates: 15.0,
            fats: 0.0,
            fiber: Some(2.0),
            micronutrients: Micronutrients {
                potassium: Some(350.0),
                ..Default::default()
            },
            notes: None,
            is_custom: false,
        }
    }

    #[test]
    fn test_create_and_filter() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let banana = FoodExchange::create(conn, &exchange("Platano", ExchangeCategory::Fruits))?;
            FoodExchange::create(conn, &exchange("Tortilla", ExchangeCategory::Cereals))?;

            assert_eq!(banana.micronutrients.potassium, Some(350.0));
            assert_eq!(FoodExchange::list(conn, None)?.len(), 2);
            let fruits = FoodExchange::list(conn, Some(ExchangeCategory::Fruits))?;
            assert_eq!(fruits.len(), 1);
            assert_eq!(fruits[0].name, "Platano");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_partial_update() {
        let db = Database::in_memory().unwrap();
        let updated = db
            .with_conn(|conn| {
                let e = FoodExchange::create(conn, &exchange("Manzana", ExchangeCategory::Fruits))?;
                let data = FoodExchangeUpdate {
                    calories: Some(55.0),
                    micronutrients: Micronutrients {
                        vitamin_c: Some(6.0),
                        ..Default::default()
                    },
                    ..Default::default()
                };
                FoodExchange::update(conn, e.id, &data)
            })
            .unwrap()
            .unwrap();

        assert_eq!(updated.calories, 55.0);
        assert_eq!(updated.micronutrients.vitamin_c, Some(6.0));
        assert_eq!(updated.micronutrients.potassium, Some(350.0));
        assert_eq!(updated.carbohydrates, 15.0);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(ExchangeCategory::from_str("Lacteos"), Some(ExchangeCategory::Dairy));
        assert_eq!(ExchangeCategory::from_str("meat"), Some(ExchangeCategory::Meat));
        assert_eq!(ExchangeCategory::from_str("snacks"), None);
    }
}
