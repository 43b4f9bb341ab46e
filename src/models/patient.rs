//! Patient model
//!
//! A patient belongs to exactly one nutritionist. Identification numbers are
//! unique per nutritionist.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::calculations::{ActivityLevel, BodyProfile, Gender, PatientType};
use crate::db::DbResult;
use super::{parse_date, Anthropometrics};

/// Dietary pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DietType {
    #[default]
    Omnivore,
    Vegetarian,
    Vegan,
}

impl DietType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Omnivore => "omnivore",
            DietType::Vegetarian => "vegetarian",
            DietType::Vegan => "vegan",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vegetarian" | "vegetariano" => DietType::Vegetarian,
            "vegan" | "vegano" => DietType::Vegan,
            _ => DietType::Omnivore,
        }
    }
}

/// A patient record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub nutritionist_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub identification: String,
    pub birth_date: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub weight: f64,
    pub height: f64,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    pub medical_history: Option<String>,
    pub nutritional_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub patient_type: PatientType,
    pub activity_level: ActivityLevel,
    pub diet_type: DietType,
    pub has_diabetes: bool,
    pub has_hypertension: bool,
    pub has_bloating: bool,
    pub other_conditions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a patient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientCreate {
    pub first_name: String,
    pub last_name: String,
    pub identification: String,
    pub birth_date: String,
    #[serde(default)]
    pub gender: Gender,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub weight: f64,
    pub height: f64,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    pub medical_history: Option<String>,
    pub nutritional_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    #[serde(default)]
    pub patient_type: PatientType,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub diet_type: DietType,
    #[serde(default)]
    pub has_diabetes: bool,
    #[serde(default)]
    pub has_hypertension: bool,
    #[serde(default)]
    pub has_bloating: bool,
    pub other_conditions: Option<String>,
}

/// Data for updating a patient; only `Some` fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub identification: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    pub medical_history: Option<String>,
    pub nutritional_history: Option<String>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub patient_type: Option<PatientType>,
    pub activity_level: Option<ActivityLevel>,
    pub diet_type: Option<DietType>,
    pub has_diabetes: Option<bool>,
    pub has_hypertension: Option<bool>,
    pub has_bloating: Option<bool>,
    pub other_conditions: Option<String>,
}

impl Patient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            nutritionist_id: row.get("nutritionist_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            identification: row.get("identification")?,
            birth_date: row.get("birth_date")?,
            gender: Gender::from_str(row.get::<_, String>("gender")?.as_str()),
            email: row.get("email")?,
            phone: row.get("phone")?,
            address: row.get("address")?,
            weight: row.get("weight")?,
            height: row.get("height")?,
            anthropometrics: Anthropometrics::from_row(row)?,
            medical_history: row.get("medical_history")?,
            nutritional_history: row.get("nutritional_history")?,
            allergies: row.get("allergies")?,
            medications: row.get("medications")?,
            patient_type: PatientType::from_str(row.get::<_, String>("patient_type")?.as_str()),
            activity_level: ActivityLevel::from_str(row.get::<_, String>("activity_level")?.as_str()),
            diet_type: DietType::from_str(row.get::<_, String>("diet_type")?.as_str()),
            has_diabetes: row.get("has_diabetes")?,
            has_hypertension: row.get("has_hypertension")?,
            has_bloating: row.get("has_bloating")?,
            other_conditions: row.get("other_conditions")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new patient owned by `nutritionist_id`
    pub fn create(conn: &Connection, nutritionist_id: i64, data: &PatientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO patients (
                nutritionist_id, first_name, last_name, identification, birth_date, gender,
                email, phone, address, weight, height,
                medical_history, nutritional_history, allergies, medications,
                patient_type, activity_level, diet_type,
                has_diabetes, has_hypertension, has_bloating, other_conditions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22)
            "#,
            params![
                nutritionist_id,
                data.first_name,
                data.last_name,
                data.identification,
                data.birth_date,
                data.gender.as_str(),
                data.email,
                data.phone,
                data.address,
                data.weight,
                data.height,
                data.medical_history,
                data.nutritional_history,
                data.allergies,
                data.medications,
                data.patient_type.as_str(),
                data.activity_level.as_str(),
                data.diet_type.as_str(),
                data.has_diabetes,
                data.has_hypertension,
                data.has_bloating,
                data.other_conditions,
            ],
        )?;

        let id = conn.last_insert_rowid();
        for (col, val) in data.anthropometrics.present() {
            conn.execute(&format!("UPDATE patients SET {} = ?1 WHERE id = ?2", col), params![val, id])?;
        }

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a patient by ID regardless of owner
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a patient only if `nutritionist_id` owns it
    pub fn get_owned(conn: &Connection, id: i64, nutritionist_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM patients WHERE id = ?1 AND nutritionist_id = ?2"
        )?;

        let result = stmt.query_row(params![id, nutritionist_id], Self::from_row);
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List a nutritionist's patients by name
    pub fn list(conn: &Connection, nutritionist_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM patients
            WHERE nutritionist_id = ?1
            ORDER BY last_name ASC, first_name ASC
            LIMIT ?2 OFFSET ?3
            "#
        )?;

        let patients = stmt
            .query_map(params![nutritionist_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }

    /// Search a nutritionist's patients by name or identification
    pub fn search(conn: &Connection, nutritionist_id: i64, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM patients
            WHERE nutritionist_id = ?1
              AND (first_name LIKE ?2 OR last_name LIKE ?2 OR identification LIKE ?2
                   OR (first_name || ' ' || last_name) LIKE ?2)
            ORDER BY last_name ASC, first_name ASC
            LIMIT ?3
            "#
        )?;

        let patients = stmt
            .query_map(params![nutritionist_id, search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }

    /// Whether another patient of this nutritionist already uses `identification`
    pub fn identification_taken(
        conn: &Connection,
        nutritionist_id: i64,
        identification: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM patients
            WHERE nutritionist_id = ?1 AND identification = ?2 AND id != ?3
            "#,
            params![nutritionist_id, identification, exclude_id.unwrap_or(0)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Update a patient
    pub fn update(conn: &Connection, id: i64, data: &PatientUpdate) -> DbResult<Option<Self>> {
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

        macro_rules! add_enum_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.as_str().to_string()));
                }
            };
        }

        add_update!(first_name, "first_name");
        add_update!(last_name, "last_name");
        add_update!(identification, "identification");
        add_update!(birth_date, "birth_date");
        add_enum_update!(gender, "gender");
        add_update!(email, "email");
        add_update!(phone, "phone");
        add_update!(address, "address");
        add_update!(weight, "weight");
        add_update!(height, "height");
        add_update!(medical_history, "medical_history");
        add_update!(nutritional_history, "nutritional_history");
        add_update!(allergies, "allergies");
        add_update!(medications, "medications");
        add_enum_update!(patient_type, "patient_type");
        add_enum_update!(activity_level, "activity_level");
        add_enum_update!(diet_type, "diet_type");
        add_update!(has_diabetes, "has_diabetes");
        add_update!(has_hypertension, "has_hypertension");
        add_update!(has_bloating, "has_bloating");
        add_update!(other_conditions, "other_conditions");

        for (col, val) in data.anthropometrics.present() {
            updates.push(format!("{} = ?{}", col, params_vec.len() + 1));
            params_vec.push(Box::new(val));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE patients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Record a new activity level, as reported during a consultation
    pub fn set_activity_level(conn: &Connection, id: i64, level: ActivityLevel) -> DbResult<()> {
        conn.execute(
            "UPDATE patients SET activity_level = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![level.as_str(), id],
        )?;
        Ok(())
    }

    /// Delete a patient; consultations, meal plans and preferences cascade
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM patients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Parsed birth date, if the stored text is a valid date
    pub fn birth_date(&self) -> Option<NaiveDate> {
        parse_date(&self.birth_date)
    }

    /// Inputs for the nutrition calculator
    pub fn profile(&self) -> Option<BodyProfile> {
        Some(BodyProfile {
            birth_date: self.birth_date()?,
            gender: self.gender,
            weight_kg: self.weight,
            height_cm: self.height,
            activity_level: self.activity_level,
            patient_type: self.patient_type,
        })
    }
}
