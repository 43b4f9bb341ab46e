//! Menu model
//!
//! Reusable full-day menus grouped by clinical category.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// Clinical category a menu targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MenuCategory {
    #[default]
    Healthy,
    Diabetes,
    Hypertension,
    Bloating,
    Vegetarian,
    Vegan,
    Athlete,
    Other,
}

impl MenuCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Healthy => "healthy",
            MenuCategory::Diabetes => "diabetes",
            MenuCategory::Hypertension => "hypertension",
            MenuCategory::Bloating => "bloating",
            MenuCategory::Vegetarian => "vegetarian",
            MenuCategory::Vegan => "vegan",
            MenuCategory::Athlete => "athlete",
            MenuCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "healthy" | "sano" => MenuCategory::Healthy,
            "diabetes" => MenuCategory::Diabetes,
            "hypertension" | "hipertension" => MenuCategory::Hypertension,
            "bloating" | "distension_abdominal" => MenuCategory::Bloating,
            "vegetarian" | "vegetariano" => MenuCategory::Vegetarian,
            "vegan" | "vegano" => MenuCategory::Vegan,
            "athlete" | "deportista" => MenuCategory::Athlete,
            _ => MenuCategory::Other,
        }
    }
}

/// A full-day menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub category: MenuCategory,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub breakfast: Option<String>,
    pub mid_morning_snack: Option<String>,
    pub lunch: Option<String>,
    pub afternoon_snack: Option<String>,
    pub dinner: Option<String>,
    pub is_custom: bool,
    pub supplements: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a menu
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuCreate {
    pub name: String,
    #[serde(default)]
    pub category: MenuCategory,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub breakfast: Option<String>,
    pub mid_morning_snack: Option<String>,
    pub lunch: Option<String>,
    pub afternoon_snack: Option<String>,
    pub dinner: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    pub supplements: Option<String>,
}

/// Data for updating a menu
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub category: Option<MenuCategory>,
    pub description: Option<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    pub breakfast: Option<String>,
    pub mid_morning_snack: Option<String>,
    pub lunch: Option<String>,
    pub afternoon_snack: Option<String>,
    pub dinner: Option<String>,
    pub is_custom: Option<bool>,
    pub supplements: Option<String>,
}

impl Menu {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            category: MenuCategory::from_str(row.get::<_, String>("category")?.as_str()),
            description: row.get("description")?,
            calories: row.get("calories")?,
            proteins: row.get("proteins")?,
            carbohydrates: row.get("carbohydrates")?,
            fats: row.get("fats")?,
            fiber: row.get("fiber")?,
            breakfast: row.get("breakfast")?,
            mid_morning_snack: row.get("mid_morning_snack")?,
            lunch: row.get("lunch")?,
            afternoon_snack: row.get("afternoon_snack")?,
            dinner: row.get("dinner")?,
            is_custom: row.get("is_custom")?,
            supplements: row.get("supplements")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new menu
    pub fn create(conn: &Connection, data: &MenuCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO menus (
                name, category, description, calories, proteins, carbohydrates, fats, fiber,
                breakfast, mid_morning_snack, lunch, afternoon_snack, dinner, is_custom, supplements
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                data.name,
                data.category.as_str(),
                data.description,
                data.calories,
                data.proteins,
                data.carbohydrates,
                data.fats,
                data.fiber,
                data.breakfast,
                data.mid_morning_snack,
                data.lunch,
                data.afternoon_snack,
                data.dinner,
                data.is_custom,
                data.supplements,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a menu by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM menus WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(menu) => Ok(Some(menu)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List menus, optionally restricted to one category
    pub fn list(conn: &Connection, category: Option<MenuCategory>) -> DbResult<Vec<Self>> {
        let menus = if let Some(cat) = category {
            let mut stmt = conn.prepare("SELECT * FROM menus WHERE category = ?1 ORDER BY name ASC")?;
            let rows = stmt.query_map([cat.as_str()], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare("SELECT * FROM menus ORDER BY name ASC")?;
            let rows = stmt.query_map([], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        Ok(menus)
    }

    /// Update a menu
    pub fn update(conn: &Connection, id: i64, data: &MenuUpdate) -> DbResult<Option<Self>> {
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
        add_update!(calories, "calories");
        add_update!(proteins, "proteins");
        add_update!(carbohydrates, "carbohydrates");
        add_update!(fats, "fats");
        add_update!(fiber, "fiber");
        add_update!(breakfast, "breakfast");
        add_update!(mid_morning_snack, "mid_morning_snack");
        add_update!(lunch, "lunch");
        add_update!(afternoon_snack, "afternoon_snack");
        add_update!(dinner, "dinner");
        add_update!(is_custom, "is_custom");
        add_update!(supplements, "supplements");

        if let Some(ref cat) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(cat.as_str().to_string()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE menus SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete a menu
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM menus WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn menu(name: &str, category: MenuCategory) -> MenuCreate {
        MenuCreate {
            name: name.to_string(),
            category,
            breakfast: Some("Avena con fruta".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_list_with_category_filter() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            Menu::create(conn, &menu("Bajo en sodio", MenuCategory::Hypertension))?;
            Menu::create(conn, &menu("Control glucemico", MenuCategory::Diabetes))?;
            Menu::create(conn, &menu("Basico", MenuCategory::Diabetes))?;

            assert_eq!(Menu::list(conn, None)?.len(), 3);
            let diabetes = Menu::list(conn, Some(MenuCategory::Diabetes))?;
            assert_eq!(diabetes.len(), 2);
            assert_eq!(diabetes[0].name, "Basico");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_and_delete() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let m = Menu::create(conn, &menu("Deportivo", MenuCategory::Athlete))?;
            let data = MenuUpdate {
                supplements: Some("Creatina 5 g".to_string()),
                is_custom: Some(true),
                ..Default::default()
            };
            let updated = Menu::update(conn, m.id, &data)?.unwrap();
            assert_eq!(updated.supplements.as_deref(), Some("Creatina 5 g"));
            assert!(updated.is_custom);
            assert_eq!(updated.breakfast.as_deref(), Some("Avena con fruta"));

            assert!(Menu::delete(conn, m.id)?);
            assert!(Menu::get_by_id(conn, m.id)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(MenuCategory::from_str("distension_abdominal"), MenuCategory::Bloating);
        assert_eq!(MenuCategory::from_str("Hipertension"), MenuCategory::Hypertension);
        assert_eq!(MenuCategory::from_str("???"), MenuCategory::Other);
    }
}
