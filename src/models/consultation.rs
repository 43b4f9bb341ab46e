//! Consultation model
//!
//! A dated follow-up visit. Stores the reading taken that day together with
//! the figures derived from it.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::calculations::ActivityLevel;
use crate::db::DbResult;
use super::Anthropometrics;

/// A consultation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub consultation_date: String,
    pub weight: f64,
    pub height: f64,
    pub bmi: Option<f64>,
    pub weight_change: Option<f64>,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    pub activity_level_changed: bool,
    pub new_activity_level: Option<ActivityLevel>,
    #[serde(flatten)]
    pub derived: DerivedFigures,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub diet_plan: Option<String>,
    pub clinical_observations: Option<String>,
    pub follow_up_notes: Option<String>,
    pub next_appointment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Figures computed from a reading rather than entered
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedFigures {
    pub caloric_requirement: Option<f64>,
    pub healthy_weight: Option<f64>,
    pub adjusted_weight: Option<f64>,
}

/// Data for recording a consultation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultationCreate {
    /// Defaults to now when absent
    pub consultation_date: Option<String>,
    pub weight: f64,
    pub height: f64,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    #[serde(default)]
    pub activity_level_changed: bool,
    pub new_activity_level: Option<ActivityLevel>,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub diet_plan: Option<String>,
    pub clinical_observations: Option<String>,
    pub follow_up_notes: Option<String>,
    pub next_appointment: Option<String>,
}

/// Data for updating a consultation; only `Some` fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultationUpdate {
    pub consultation_date: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    #[serde(flatten)]
    pub anthropometrics: Anthropometrics,
    pub notes: Option<String>,
    pub recommendations: Option<String>,
    pub diet_plan: Option<String>,
    pub clinical_observations: Option<String>,
    pub follow_up_notes: Option<String>,
    pub next_appointment: Option<String>,
}

/// A scheduled follow-up, joined with its patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingAppointment {
    pub consultation_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub next_appointment: String,
    pub last_weight: f64,
}

impl Consultation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            consultation_date: row.get("consultation_date")?,
            weight: row.get("weight")?,
            height: row.get("height")?,
            bmi: row.get("bmi")?,
            weight_change: row.get("weight_change")?,
            anthropometrics: Anthropometrics::from_row(row)?,
            activity_level_changed: row.get("activity_level_changed")?,
            new_activity_level: row
                .get::<_, Option<String>>("new_activity_level")?
                .map(|s| ActivityLevel::from_str(&s)),
            derived: DerivedFigures {
                caloric_requirement: row.get("caloric_requirement")?,
                healthy_weight: row.get("healthy_weight")?,
                adjusted_weight: row.get("adjusted_weight")?,
            },
            notes: row.get("notes")?,
            recommendations: row.get("recommendations")?,
            diet_plan: row.get("diet_plan")?,
            clinical_observations: row.get("clinical_observations")?,
            follow_up_notes: row.get("follow_up_notes")?,
            next_appointment: row.get("next_appointment")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a consultation with its already-computed figures
    pub fn create(
        conn: &Connection,
        patient_id: i64,
        data: &ConsultationCreate,
        bmi: f64,
        weight_change: Option<f64>,
        derived: &DerivedFigures,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO consultations (
                patient_id, consultation_date, weight, height, bmi, weight_change,
                activity_level_changed, new_activity_level,
                caloric_requirement, healthy_weight, adjusted_weight,
                notes, recommendations, diet_plan, clinical_observations, follow_up_notes,
                next_appointment
            ) VALUES (?1, COALESCE(?2, datetime('now')), ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                      ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                patient_id,
                data.consultation_date,
                data.weight,
                data.height,
                bmi,
                weight_change,
                data.activity_level_changed,
                data.new_activity_level.map(|l| l.as_str()),
                derived.caloric_requirement,
                derived.healthy_weight,
                derived.adjusted_weight,
                data.notes,
                data.recommendations,
                data.diet_plan,
                data.clinical_observations,
                data.follow_up_notes,
                data.next_appointment,
            ],
        )?;

        let id = conn.last_insert_rowid();
        for (col, val) in data.anthropometrics.present() {
            conn.execute(
                &format!("UPDATE consultations SET {} = ?1 WHERE id = ?2", col),
                params![val, id],
            )?;
        }

        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a consultation by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM consultations WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a consultation only if its patient belongs to `nutritionist_id`
    pub fn get_owned(conn: &Connection, id: i64, nutritionist_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT c.* FROM consultations c
            INNER JOIN patients p ON p.id = c.patient_id
            WHERE c.id = ?1 AND p.nutritionist_id = ?2
            "#
        )?;

        let result = stmt.query_row(params![id, nutritionist_id], Self::from_row);
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Consultations of one patient, newest first
    pub fn list_for_patient(conn: &Connection, patient_id: i64, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM consultations
            WHERE patient_id = ?1
            ORDER BY consultation_date DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#
        )?;

        let consultations = stmt
            .query_map(params![patient_id, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(consultations)
    }

    /// Most recent consultation of a patient
    pub fn latest_for_patient(conn: &Connection, patient_id: i64) -> DbResult<Option<Self>> {
        Ok(Self::list_for_patient(conn, patient_id, 1, 0)?.into_iter().next())
    }

    /// Every consultation, oldest first
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM consultations ORDER BY consultation_date ASC, id ASC")?;

        let consultations = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(consultations)
    }

    /// Update entered fields
    pub fn update(conn: &Connection, id: i64, data: &ConsultationUpdate) -> DbResult<Option<Self>> {
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

        add_update!(consultation_date, "consultation_date");
        add_update!(weight, "weight");
        add_update!(height, "height");
        add_update!(notes, "notes");
        add_update!(recommendations, "recommendations");
        add_update!(diet_plan, "diet_plan");
        add_update!(clinical_observations, "clinical_observations");
        add_update!(follow_up_notes, "follow_up_notes");
        add_update!(next_appointment, "next_appointment");

        for (col, val) in data.anthropometrics.present() {
            updates.push(format!("{} = ?{}", col, params_vec.len() + 1));
            params_vec.push(Box::new(val));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE consultations SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );
        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Overwrite BMI and derived figures
    pub fn set_derived(conn: &Connection, id: i64, bmi: f64, derived: &DerivedFigures) -> DbResult<()> {
        conn.execute(
            r#"
            UPDATE consultations SET
                bmi = ?1,
                caloric_requirement = ?2,
                healthy_weight = ?3,
                adjusted_weight = ?4,
                updated_at = datetime('now')
            WHERE id = ?5
            "#,
            params![
                bmi,
                derived.caloric_requirement,
                derived.healthy_weight,
                derived.adjusted_weight,
                id,
            ],
        )?;
        Ok(())
    }

    /// Delete a consultation
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM consultations WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Scheduled follow-ups at or after `now` for a nutritionist's patients
    pub fn upcoming(conn: &Connection, nutritionist_id: i64, now: &str) -> DbResult<Vec<UpcomingAppointment>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.patient_id, p.first_name, p.last_name, c.next_appointment, c.weight
            FROM consultations c
            INNER JOIN patients p ON p.id = c.patient_id
            WHERE p.nutritionist_id = ?1
              AND c.next_appointment IS NOT NULL
              AND c.next_appointment >= ?2
            ORDER BY c.next_appointment ASC
            "#
        )?;

        let appointments = stmt
            .query_map(params![nutritionist_id, now], |row| {
                let first: String = row.get(2)?;
                let last: String = row.get(3)?;
                Ok(UpcomingAppointment {
                    consultation_id: row.get(0)?,
                    patient_id: row.get(1)?,
                    patient_name: format!("{} {}", first, last),
                    next_appointment: row.get(4)?,
                    last_weight: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(appointments)
    }
}
