//! Snack model
//!
//! Between-meal options with dietary suitability flags.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Snack flavor/type group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnackCategory {
    Sweet,
    Salty,
    Protein,
    Fruit,
    Vegetable,
    Mixed,
}

impl SnackCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnackCategory::Sweet => "sweet",
            SnackCategory::Salty => "salty",
            SnackCategory::Protein => "protein",
            SnackCategory::Fruit => "fruit",
            SnackCategory::Vegetable => "vegetable",
            SnackCategory::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sweet" | "dulce" => Some(SnackCategory::Sweet),
            "salty" | "salado" => Some(SnackCategory::Salty),
            "protein" | "proteina" => Some(SnackCategory::Protein),
            "fruit" | "fruta" => Some(SnackCategory::Fruit),
            "vegetable" | "vegetal" => Some(SnackCategory::Vegetable),
            "mixed" | "mixto" => Some(SnackCategory::Mixed),
            _ => None,
        }
    }
}

/// Dietary suitability flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnackFlags {
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_diabetic_friendly: bool,
    pub is_low_sodium: bool,
}

/// A snack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snack {
    pub id: i64,
    pub name: String,
    pub category: Option<SnackCategory>,
    pub description: Option<String>,
    pub recipe: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    #[serde(flatten)]
    pub flags: SnackFlags,
    pub is_custom: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a snack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnackCreate {
    pub name: String,
    pub category: Option<SnackCategory>,
    pub description: Option<String>,
    pub recipe: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    #[serde(flatten)]
    pub flags: SnackFlags,
    #[serde(default)]
    pub is_custom: bool,
}

/// Data for updating a snack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnackUpdate {
    pub name: Option<String>,
    pub category: Option<SnackCategory>,
    pub description: Option<String>,
    pub recipe: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_diabetic_friendly: Option<bool>,
    pub is_low_sodium: Option<bool>,
    pub is_custom: Option<bool>,
}

/// Optional list filters; `None` means "don't filter"
#[derive(Debug, Clone, Copy, Default)]
pub struct SnackFilter {
    pub category: Option<SnackCategory>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub diabetic_friendly: Option<bool>,
    pub low_sodium: Option<bool>,
}

impl Snack {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: row
                .get::<_, Option<String>>("category")?
                .as_deref()
                .and_then(SnackCategory::from_str),
            description: row.get("description")?,
            recipe: row.get("recipe")?,
            calories: row.get("calories")?,
            proteins: row.get("proteins")?,
            carbohydrates: row.get("carbohydrates")?,
            fats: row.get("fats")?,
            flags: SnackFlags {
                is_vegetarian: row.get("is_vegetarian")?,
                is_vegan: row.get("is_vegan")?,
                is_diabetic_friendly: row.get("is_diabetic_friendly")?,
                is_low_sodium: row.get("is_low_sodium")?,
            },
            is_custom: row.get("is_custom")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new snack
    pub fn create(conn: &Connection, data: &SnackCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO snacks (
                name, category, description, recipe, calories, proteins, carbohydrates, fats,
                is_vegetarian, is_vegan, is_diabetic_friendly, is_low_sodium, is_custom
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                data.name,
                data.category.map(|c| c.as_str()),
                data.description,
                data.recipe,
                data.calories,
                data.proteins,
                data.carbohydrates,
                data.fats,
                data.flags.is_vegetarian,
                data.flags.is_vegan,
                data.flags.is_diabetic_friendly,
                data.flags.is_low_sodium,
                data.is_custom,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a snack by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM snacks WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(snack) => Ok(Some(snack)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List snacks matching every set filter
    pub fn list(conn: &Connection, filter: &SnackFilter) -> DbResult<Vec<Self>> {
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(cat) = filter.category {
            conditions.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(cat.as_str()));
        }

        let flag_filters = [
            ("is_vegetarian", filter.vegetarian),
            ("is_vegan", filter.vegan),
            ("is_diabetic_friendly", filter.diabetic_friendly),
            ("is_low_sodium", filter.low_sodium),
        ];
        for (col, value) in flag_filters {
            if let Some(v) = value {
                conditions.push(format!("{} = ?{}", col, params_vec.len() + 1));
                params_vec.push(Box::new(v));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM snacks {} ORDER BY name ASC", where_clause);

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let snacks = stmt
            .query_map(params_refs.as_slice(), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(snacks)
    }

    /// Update a snack
    pub fn update(conn: &Connection, id: i64, data: &SnackUpdate) -> DbResult<Option<Self>> {
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

        add_update!(name, "name");
        add_update!(description, "description");
        add_update!(recipe, "recipe");
        add_update!(calories, "calories");
        add_update!(proteins, "proteins");
        add_update!(carbohydrates, "carbohydrates");
        add_update!(fats, "fats");
        add_update!(is_vegetarian, "is_vegetarian");
        add_update!(is_vegan, "is_vegan");
        add_update!(is_diabetic_friendly, "is_diabetic_friendly");
        add_update!(is_low_sodium, "is_low_sodium");
        add_update!(is_custom, "is_custom");

        if let Some(ref cat) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(cat.as_str().to_string()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE snacks SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a snack
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM snacks WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn snack(name: &str, category: SnackCategory, flags: SnackFlags) -> SnackCreate {
        SnackCreate {
            name: name.to_string(),
            category: Some(category),
            calories: Some(150.0),
            flags,
            ..Default::default()
        }
    }

    fn seed(conn: &Connection) -> DbResult<()> {
        Snack::create(conn, &snack("Hummus con zanahoria", SnackCategory::Vegetable, SnackFlags {
            is_vegetarian: true,
            is_vegan: true,
            is_diabetic_friendly: true,
            is_low_sodium: false,
        }))?;
        Snack::create(conn, &snack("Yogur griego", SnackCategory::Protein, SnackFlags {
            is_vegetarian: true,
            is_diabetic_friendly: true,
            ..Default::default()
        }))?;
        Snack::create(conn, &snack("Galletas", SnackCategory::Sweet, SnackFlags::default()))?;
        Ok(())
    }

    #[test]
    fn test_list_without_filters() {
        let db = Database::in_memory().unwrap();
        let all = db.with_conn(|conn| {
            seed(conn)?;
            Snack::list(conn, &SnackFilter::default())
        }).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_combined_filters() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            seed(conn)?;

            let vegetarian = Snack::list(conn, &SnackFilter { vegetarian: Some(true), ..Default::default() })?;
            assert_eq!(vegetarian.len(), 2);

            let vegan_diabetic = Snack::list(conn, &SnackFilter {
                vegan: Some(true),
                diabetic_friendly: Some(true),
                ..Default::default()
            })?;
            assert_eq!(vegan_diabetic.len(), 1);
            assert_eq!(vegan_diabetic[0].name, "Hummus con zanahoria");

            let not_vegetarian = Snack::list(conn, &SnackFilter { vegetarian: Some(false), ..Default::default() })?;
            assert_eq!(not_vegetarian[0].name, "Galletas");

            let sweet = Snack::list(conn, &SnackFilter { category: Some(SnackCategory::Sweet), ..Default::default() })?;
            assert_eq!(sweet.len(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_flags() {
        let db = Database::in_memory().unwrap();
        let updated = db
            .with_conn(|conn| {
                let s = Snack::create(conn, &snack("Palomitas", SnackCategory::Salty, SnackFlags::default()))?;
                let data = SnackUpdate { is_low_sodium: Some(true), ..Default::default() };
                Snack::update(conn, s.id, &data)
            })
            .unwrap()
            .unwrap();

        assert!(updated.flags.is_low_sodium);
        assert_eq!(updated.category, Some(SnackCategory::Salty));
    }
}
