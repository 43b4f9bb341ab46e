//! Patient MCP Tools
//!
//! Patient records, scoped to the acting nutritionist and gated by their
//! subscription.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::calculations::{assess, calculate_age, calculate_bmi, Assessment, Gender, PatientType};
use crate::db::Database;
use crate::models::{parse_date, Nutritionist, Patient, PatientCreate, PatientUpdate};

/// Summary of a patient for list/search results
#[derive(Debug, Serialize)]
pub struct PatientSummary {
    pub id: i64,
    pub name: String,
    pub identification: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub patient_type: PatientType,
}

impl PatientSummary {
    pub fn from_patient(patient: &Patient, now: NaiveDateTime) -> Self {
        Self {
            id: patient.id,
            name: patient.full_name(),
            identification: patient.identification.clone(),
            age: patient.birth_date().map(|b| calculate_age(b, now.date())),
            gender: patient.gender,
            weight: patient.weight,
            height: patient.height,
            bmi: calculate_bmi(patient.weight, patient.height),
            patient_type: patient.patient_type,
        }
    }
}

/// Response for create_patient
#[derive(Debug, Serialize)]
pub struct CreatePatientResponse {
    pub id: i64,
    pub name: String,
    pub patient_count: i64,
    pub patient_limit: Option<i64>,
    pub created_at: String,
}

/// Response for list_patients
#[derive(Debug, Serialize)]
pub struct ListPatientsResponse {
    pub patients: Vec<PatientSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for search_patients
#[derive(Debug, Serialize)]
pub struct SearchPatientsResponse {
    pub patients: Vec<PatientSummary>,
    pub total: usize,
}

/// Response for update_patient
#[derive(Debug, Serialize)]
pub struct UpdatePatientResponse {
    pub success: bool,
    pub patient: Patient,
}

/// Response for delete_patient
#[derive(Debug, Serialize)]
pub struct DeletePatientResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for patient_calculations
#[derive(Debug, Serialize)]
pub struct PatientCalculationsResponse {
    pub patient_id: i64,
    pub name: String,
    #[serde(flatten)]
    pub assessment: Assessment,
}

/// Load the acting nutritionist or fail
pub(crate) fn load_nutritionist(conn: &Connection, nutritionist_id: i64) -> Result<Nutritionist, String> {
    Nutritionist::get_by_id(conn, nutritionist_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Nutritionist not found with id: {}", nutritionist_id))
}

/// Load a patient owned by `nutritionist_id`; foreign patients are "not found"
pub(crate) fn load_owned_patient(conn: &Connection, patient_id: i64, nutritionist_id: i64) -> Result<Patient, String> {
    Patient::get_owned(conn, patient_id, nutritionist_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))
}

fn validate_measurements(weight: Option<f64>, height: Option<f64>) -> Result<(), String> {
    if let Some(w) = weight {
        if w <= 0.0 {
            return Err("weight must be greater than 0".to_string());
        }
    }
    if let Some(h) = height {
        if h <= 0.0 {
            return Err("height must be greater than 0".to_string());
        }
    }
    Ok(())
}

fn validate_birth_date(birth_date: &str) -> Result<(), String> {
    parse_date(birth_date)
        .map(|_| ())
        .ok_or_else(|| format!("Invalid birth_date '{}', expected YYYY-MM-DD", birth_date))
}

/// Gate, limit and uniqueness checks plus the insert, run under one write lock
fn insert_within_capacity(
    conn: &Connection,
    nutritionist_id: i64,
    data: &PatientCreate,
    now: NaiveDateTime,
) -> Result<(Patient, i64, Option<i64>), String> {
    let nutritionist = load_nutritionist(conn, nutritionist_id)?;
    nutritionist.require_active(now).map_err(|e| e.to_string())?;

    let count = Nutritionist::patient_count(conn, nutritionist_id)
        .map_err(|e| format!("Failed to count patients: {}", e))?;
    nutritionist
        .require_patient_capacity(count)
        .map_err(|e| e.to_string())?;

    let identification = data.identification.trim();
    let taken = Patient::identification_taken(conn, nutritionist_id, identification, None)
        .map_err(|e| format!("Database error: {}", e))?;
    if taken {
        return Err(format!("A patient with identification '{}' already exists", identification));
    }

    let patient = Patient::create(conn, nutritionist_id, data)
        .map_err(|e| format!("Failed to create patient: {}", e))?;

    Ok((patient, count, nutritionist.patient_limit()))
}

/// Create a patient for the acting nutritionist
pub fn create_patient(
    db: &Database,
    nutritionist_id: i64,
    data: PatientCreate,
    now: NaiveDateTime,
) -> Result<CreatePatientResponse, String> {
    if data.first_name.trim().is_empty() || data.last_name.trim().is_empty() {
        return Err("Patient first and last name cannot be empty".to_string());
    }
    if data.identification.trim().is_empty() {
        return Err("identification cannot be empty".to_string());
    }
    validate_measurements(Some(data.weight), Some(data.height))?;
    validate_birth_date(&data.birth_date)?;

    let (patient, count, patient_limit) = db
        .with_immediate_transaction(|tx| Ok(insert_within_capacity(tx, nutritionist_id, &data, now)))
        .map_err(|e| format!("Failed to create patient: {}", e))??;

    info!(patient_id = patient.id, nutritionist_id, "Created patient");

    Ok(CreatePatientResponse {
        id: patient.id,
        name: patient.full_name(),
        patient_count: count + 1,
        patient_limit,
        created_at: patient.created_at,
    })
}

/// List the acting nutritionist's patients
pub fn list_patients(
    db: &Database,
    nutritionist_id: i64,
    limit: i64,
    offset: i64,
    now: NaiveDateTime,
) -> Result<ListPatientsResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let nutritionist = load_nutritionist(&conn, nutritionist_id)?;
    nutritionist.require_active(now).map_err(|e| e.to_string())?;

    let patients = Patient::list(&conn, nutritionist_id, limit, offset)
        .map_err(|e| format!("Failed to list patients: {}", e))?;
    let total = Nutritionist::patient_count(&conn, nutritionist_id)
        .map_err(|e| format!("Failed to count patients: {}", e))?;

    Ok(ListPatientsResponse {
        patients: patients.iter().map(|p| PatientSummary::from_patient(p, now)).collect(),
        total,
        limit,
        offset,
    })
}

/// Search the acting nutritionist's patients by name or identification
pub fn search_patients(
    db: &Database,
    nutritionist_id: i64,
    query: &str,
    limit: i64,
    now: NaiveDateTime,
) -> Result<SearchPatientsResponse, String> {
    let limit = limit.min(100).max(1);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let patients = Patient::search(&conn, nutritionist_id, query.trim(), limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<PatientSummary> = patients.iter().map(|p| PatientSummary::from_patient(p, now)).collect();
    let total = summaries.len();

    Ok(SearchPatientsResponse { patients: summaries, total })
}

/// Get a patient owned by the acting nutritionist
pub fn get_patient(db: &Database, nutritionist_id: i64, patient_id: i64) -> Result<Option<Patient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Patient::get_owned(&conn, patient_id, nutritionist_id)
        .map_err(|e| format!("Failed to get patient: {}", e))
}

/// Update a patient; only provided fields change
pub fn update_patient(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    data: PatientUpdate,
) -> Result<UpdatePatientResponse, String> {
    validate_measurements(data.weight, data.height)?;
    if let Some(ref birth_date) = data.birth_date {
        validate_birth_date(birth_date)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    if let Some(ref identification) = data.identification {
        let taken = Patient::identification_taken(&conn, nutritionist_id, identification.trim(), Some(patient_id))
            .map_err(|e| format!("Database error: {}", e))?;
        if taken {
            return Err(format!("A patient with identification '{}' already exists", identification.trim()));
        }
    }

    let updated = Patient::update(&conn, patient_id, &data)
        .map_err(|e| format!("Failed to update patient: {}", e))?;

    match updated {
        Some(patient) => Ok(UpdatePatientResponse { success: true, patient }),
        None => Err(format!("Patient not found with id: {}", patient_id)),
    }
}

/// Delete a patient with all of their consultations, meal plans and preferences
pub fn delete_patient(db: &Database, nutritionist_id: i64, patient_id: i64) -> Result<DeletePatientResponse, String> {
    db.with_transaction(|tx| {
        match Patient::get_owned(tx, patient_id, nutritionist_id)? {
            Some(_) => Patient::delete(tx, patient_id).map(Some),
            None => Ok(None),
        }
    })
    .map_err(|e| format!("Failed to delete patient: {}", e))?
    .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    info!(patient_id, nutritionist_id, "Deleted patient");

    Ok(DeletePatientResponse { success: true, deleted_id: patient_id })
}

/// Derived anthropometric and caloric figures for a patient as of `now`
pub fn patient_calculations(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    now: NaiveDateTime,
) -> Result<PatientCalculationsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    let patient = load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let profile = patient
        .profile()
        .ok_or_else(|| format!("Patient {} has an invalid birth_date '{}'", patient.id, patient.birth_date))?;

    Ok(PatientCalculationsResponse {
        patient_id: patient.id,
        name: patient.full_name(),
        assessment: assess(&profile, now.date()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::BmiCategory;
    use crate::models::test_support::{nutritionist, patient_data};
    use crate::models::SubscriptionPlan;
    use chrono::{Duration, Utc};

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let n = db.with_conn(|conn| nutritionist(conn, "a@test.com")).unwrap();
        (db, n.id)
    }

    #[test]
    fn test_trial_allows_three_patients() {
        let (db, nid) = setup();
        for i in 0..3 {
            create_patient(&db, nid, patient_data(&format!("P-{}", i)), now()).unwrap();
        }
        let err = create_patient(&db, nid, patient_data("P-4"), now()).unwrap_err();
        assert_eq!(err, "Patient limit reached (3 patients)");
    }

    #[test]
    fn test_concurrent_creates_respect_limit() {
        let path = std::env::temp_dir().join(format!("nutriclinic-limit-{}.db", std::process::id()));
        let remove_files = || {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
            }
        };
        remove_files();
        let db = Database::new(&path).unwrap();
        db.with_conn(crate::db::migrations::run_migrations).unwrap();
        let nid = db.with_conn(|conn| nutritionist(conn, "a@test.com")).unwrap().id;
        for i in 0..2 {
            create_patient(&db, nid, patient_data(&format!("P-{}", i)), now()).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || create_patient(&db, nid, patient_data(&format!("C-{}", i)), now()))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let count = db.with_conn(|conn| Nutritionist::patient_count(conn, nid)).unwrap();
        assert_eq!(count, 3);

        drop(db);
        remove_files();
    }

    #[test]
    fn test_upgrade_lifts_limit() {
        let (db, nid) = setup();
        for i in 0..3 {
            create_patient(&db, nid, patient_data(&format!("P-{}", i)), now()).unwrap();
        }
        db.with_conn(|conn| Nutritionist::upgrade(conn, nid, SubscriptionPlan::Basic, now())).unwrap();

        let created = create_patient(&db, nid, patient_data("P-4"), now()).unwrap();
        assert_eq!(created.patient_count, 4);
        assert_eq!(created.patient_limit, Some(50));
    }

    #[test]
    fn test_expired_trial_blocks_listing() {
        let (db, nid) = setup();
        create_patient(&db, nid, patient_data("P-1"), now()).unwrap();

        let later = now() + Duration::days(31);
        let err = list_patients(&db, nid, 50, 0, later).unwrap_err();
        assert_eq!(err, "Trial period expired");
        assert!(create_patient(&db, nid, patient_data("P-2"), later).is_err());
    }

    #[test]
    fn test_foreign_patient_is_not_found() {
        let (db, a) = setup();
        let b = db.with_conn(|conn| nutritionist(conn, "b@test.com")).unwrap().id;
        let created = create_patient(&db, a, patient_data("P-1"), now()).unwrap();

        assert!(get_patient(&db, b, created.id).unwrap().is_none());
        assert!(get_patient(&db, a, created.id).unwrap().is_some());
        assert!(update_patient(&db, b, created.id, PatientUpdate::default()).is_err());
        assert!(delete_patient(&db, b, created.id).is_err());
        assert!(patient_calculations(&db, b, created.id, now()).is_err());
        assert_eq!(list_patients(&db, b, 50, 0, now()).unwrap().total, 0);
    }

    #[test]
    fn test_validation() {
        let (db, nid) = setup();

        let mut bad_weight = patient_data("P-1");
        bad_weight.weight = 0.0;
        assert_eq!(create_patient(&db, nid, bad_weight, now()).unwrap_err(), "weight must be greater than 0");

        let mut bad_date = patient_data("P-1");
        bad_date.birth_date = "14/05/1990".to_string();
        assert!(create_patient(&db, nid, bad_date, now()).unwrap_err().contains("birth_date"));

        create_patient(&db, nid, patient_data("P-1"), now()).unwrap();
        assert!(create_patient(&db, nid, patient_data("P-1"), now()).unwrap_err().contains("already exists"));
    }

    #[test]
    fn test_delete_removes_patient() {
        let (db, nid) = setup();
        let created = create_patient(&db, nid, patient_data("P-1"), now()).unwrap();
        let deleted = delete_patient(&db, nid, created.id).unwrap();
        assert_eq!(deleted.deleted_id, created.id);
        assert!(get_patient(&db, nid, created.id).unwrap().is_none());
    }

    #[test]
    fn test_calculations_for_stored_patient() {
        let (db, nid) = setup();
        let created = create_patient(&db, nid, patient_data("P-1"), now()).unwrap();

        let reference = chrono::NaiveDate::from_ymd_opt(2025, 5, 14).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let calc = patient_calculations(&db, nid, created.id, reference).unwrap();
        assert_eq!(calc.assessment.age, 35);
        assert_eq!(calc.assessment.bmi, 22.04);
        assert_eq!(calc.assessment.bmi_category, BmiCategory::Normal);
        assert_eq!(calc.assessment.weight_used, 60.0);
    }

    #[test]
    fn test_search_is_scoped() {
        let (db, a) = setup();
        let b = db.with_conn(|conn| nutritionist(conn, "b@test.com")).unwrap().id;
        create_patient(&db, a, patient_data("P-1"), now()).unwrap();
        create_patient(&db, b, patient_data("P-1"), now()).unwrap();

        let found = search_patients(&db, a, "Laura", 10, now()).unwrap();
        assert_eq!(found.total, 1);
    }
}
