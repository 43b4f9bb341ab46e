//! Consultation MCP Tools
//!
//! Follow-up visits. Each new reading gets BMI, weight change, healthy and
//! adjusted weight, and a caloric requirement computed on write.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::calculations::{
    calculate_adjusted_weight, calculate_age, calculate_bmi, calculate_caloric_requirement,
    calculate_ideal_weight, round2, today, ActivityLevel,
};
use crate::db::Database;
use crate::models::{
    format_datetime, parse_datetime, Consultation, ConsultationCreate, ConsultationUpdate,
    DerivedFigures, Patient, UpcomingAppointment,
};

use super::patients::load_owned_patient;

/// Summary of a consultation for list results
#[derive(Debug, Serialize)]
pub struct ConsultationSummary {
    pub id: i64,
    pub consultation_date: String,
    pub weight: f64,
    pub bmi: Option<f64>,
    pub weight_change: Option<f64>,
    pub caloric_requirement: Option<f64>,
    pub next_appointment: Option<String>,
}

impl From<&Consultation> for ConsultationSummary {
    fn from(c: &Consultation) -> Self {
        Self {
            id: c.id,
            consultation_date: c.consultation_date.clone(),
            weight: c.weight,
            bmi: c.bmi,
            weight_change: c.weight_change,
            caloric_requirement: c.derived.caloric_requirement,
            next_appointment: c.next_appointment.clone(),
        }
    }
}

/// Response for list_consultations
#[derive(Debug, Serialize)]
pub struct ListConsultationsResponse {
    pub patient_id: i64,
    pub consultations: Vec<ConsultationSummary>,
    pub total: usize,
}

/// Response for create_consultation
#[derive(Debug, Serialize)]
pub struct CreateConsultationResponse {
    pub consultation: Consultation,
    /// Set when the patient's stored activity level was changed
    pub patient_activity_level: Option<ActivityLevel>,
}

/// Response for delete_consultation
#[derive(Debug, Serialize)]
pub struct DeleteConsultationResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for upcoming_appointments
#[derive(Debug, Serialize)]
pub struct UpcomingAppointmentsResponse {
    pub appointments: Vec<UpcomingAppointment>,
    pub total: usize,
}

/// BMI and derived figures for one reading of `patient`
pub fn derive_figures(
    patient: &Patient,
    weight: f64,
    height: f64,
    activity_level: ActivityLevel,
    on_date: NaiveDate,
) -> (f64, DerivedFigures) {
    let bmi = calculate_bmi(weight, height);
    let healthy_weight = calculate_ideal_weight(height, patient.gender);
    let adjusted_weight = calculate_adjusted_weight(weight, healthy_weight);

    let caloric_requirement = patient.birth_date().map(|birth| {
        let age = calculate_age(birth, on_date);
        calculate_caloric_requirement(weight, height, age, patient.gender, activity_level, patient.patient_type)
            .caloric_requirement
    });

    (
        bmi,
        DerivedFigures {
            caloric_requirement,
            healthy_weight: Some(healthy_weight),
            adjusted_weight: Some(adjusted_weight),
        },
    )
}

/// Activity level a consultation's figures are computed with. A new level
/// only applies when the consultation records an activity change.
pub fn effective_activity_level(
    changed: bool,
    new_level: Option<ActivityLevel>,
    patient_level: ActivityLevel,
) -> ActivityLevel {
    match (changed, new_level) {
        (true, Some(level)) => level,
        _ => patient_level,
    }
}

fn validate_reading(weight: Option<f64>, height: Option<f64>) -> Result<(), String> {
    if matches!(weight, Some(w) if w <= 0.0) {
        return Err("weight must be greater than 0".to_string());
    }
    if matches!(height, Some(h) if h <= 0.0) {
        return Err("height must be greater than 0".to_string());
    }
    Ok(())
}

/// Normalize a user-supplied timestamp to storage format
fn normalize_datetime(field: &str, value: Option<String>) -> Result<Option<String>, String> {
    match value {
        Some(v) => parse_datetime(&v)
            .map(|dt| Some(format_datetime(dt)))
            .ok_or_else(|| format!("Invalid {} '{}', expected YYYY-MM-DD[ HH:MM[:SS]]", field, v)),
        None => Ok(None),
    }
}

/// Record a consultation for a patient of the acting nutritionist
pub fn create_consultation(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    mut data: ConsultationCreate,
    now: NaiveDateTime,
) -> Result<CreateConsultationResponse, String> {
    validate_reading(Some(data.weight), Some(data.height))?;
    data.consultation_date = normalize_datetime("consultation_date", data.consultation_date)?;
    data.next_appointment = normalize_datetime("next_appointment", data.next_appointment)?;

    let new_level = match (data.activity_level_changed, data.new_activity_level) {
        (true, Some(level)) => Some(level),
        (true, None) => return Err("new_activity_level is required when activity_level_changed is set".to_string()),
        (false, _) => None,
    };

    let on_date = data
        .consultation_date
        .as_deref()
        .and_then(parse_datetime)
        .unwrap_or(now)
        .date();

    let consultation = db
        .with_transaction(|tx| {
            let Some(patient) = Patient::get_owned(tx, patient_id, nutritionist_id)? else {
                return Ok(None);
            };

            let weight_change = Consultation::latest_for_patient(tx, patient_id)?
                .map(|prev| round2(data.weight - prev.weight));

            let activity_level =
                effective_activity_level(data.activity_level_changed, new_level, patient.activity_level);
            let (bmi, derived) = derive_figures(&patient, data.weight, data.height, activity_level, on_date);

            let consultation = Consultation::create(tx, patient_id, &data, bmi, weight_change, &derived)?;

            if let Some(level) = new_level {
                Patient::set_activity_level(tx, patient_id, level)?;
            }

            Ok(Some(consultation))
        })
        .map_err(|e| format!("Failed to create consultation: {}", e))?
        .ok_or_else(|| format!("Patient not found with id: {}", patient_id))?;

    info!(consultation_id = consultation.id, patient_id, "Recorded consultation");

    Ok(CreateConsultationResponse {
        consultation,
        patient_activity_level: new_level,
    })
}

/// List a patient's consultations, newest first
pub fn list_consultations(
    db: &Database,
    nutritionist_id: i64,
    patient_id: i64,
    limit: i64,
    offset: i64,
) -> Result<ListConsultationsResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    load_owned_patient(&conn, patient_id, nutritionist_id)?;

    let consultations = Consultation::list_for_patient(&conn, patient_id, limit, offset)
        .map_err(|e| format!("Failed to list consultations: {}", e))?;

    let summaries: Vec<ConsultationSummary> = consultations.iter().map(ConsultationSummary::from).collect();
    let total = summaries.len();

    Ok(ListConsultationsResponse {
        patient_id,
        consultations: summaries,
        total,
    })
}

/// Get a consultation of one of the acting nutritionist's patients
pub fn get_consultation(db: &Database, nutritionist_id: i64, id: i64) -> Result<Option<Consultation>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Consultation::get_owned(&conn, id, nutritionist_id)
        .map_err(|e| format!("Failed to get consultation: {}", e))
}

/// Update a consultation. BMI and derived figures follow weight or height.
pub fn update_consultation(
    db: &Database,
    nutritionist_id: i64,
    id: i64,
    mut data: ConsultationUpdate,
) -> Result<Consultation, String> {
    validate_reading(data.weight, data.height)?;
    data.consultation_date = normalize_datetime("consultation_date", data.consultation_date)?;
    data.next_appointment = normalize_datetime("next_appointment", data.next_appointment)?;

    let remeasured = data.weight.is_some() || data.height.is_some();

    db.with_transaction(|tx| {
        if Consultation::get_owned(tx, id, nutritionist_id)?.is_none() {
            return Ok(None);
        }

        let Some(updated) = Consultation::update(tx, id, &data)? else {
            return Ok(None);
        };

        if !remeasured {
            return Ok(Some(updated));
        }

        let Some(patient) = Patient::get_by_id(tx, updated.patient_id)? else {
            return Ok(Some(updated));
        };
        let activity_level = effective_activity_level(
            updated.activity_level_changed,
            updated.new_activity_level,
            patient.activity_level,
        );
        let on_date = parse_datetime(&updated.consultation_date)
            .map(|dt| dt.date())
            .unwrap_or_else(today);
        let (bmi, derived) = derive_figures(&patient, updated.weight, updated.height, activity_level, on_date);

        debug!(consultation_id = id, bmi, "Recomputed consultation figures");
        Consultation::set_derived(tx, id, bmi, &derived)?;
        Consultation::get_by_id(tx, id)
    })
    .map_err(|e| format!("Failed to update consultation: {}", e))?
    .ok_or_else(|| format!("Consultation not found with id: {}", id))
}

/// Delete a consultation
pub fn delete_consultation(db: &Database, nutritionist_id: i64, id: i64) -> Result<DeleteConsultationResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = Consultation::get_owned(&conn, id, nutritionist_id)
        .map_err(|e| format!("Database error: {}", e))?;
    if existing.is_none() {
        return Err(format!("Consultation not found with id: {}", id));
    }

    Consultation::delete(&conn, id)
        .map_err(|e| format!("Failed to delete consultation: {}", e))?;

    Ok(DeleteConsultationResponse { success: true, deleted_id: id })
}

/// Scheduled follow-ups from `now` onwards, soonest first
pub fn upcoming_appointments(
    db: &Database,
    nutritionist_id: i64,
    now: NaiveDateTime,
) -> Result<UpcomingAppointmentsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let appointments = Consultation::upcoming(&conn, nutritionist_id, &format_datetime(now))
        .map_err(|e| format!("Failed to list appointments: {}", e))?;
    let total = appointments.len();

    Ok(UpcomingAppointmentsResponse { appointments, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{nutritionist, patient_data};

    fn at(date: &str) -> NaiveDateTime {
        parse_datetime(date).unwrap()
    }

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        let (nid, pid) = db
            .with_conn(|conn| {
                let n = nutritionist(conn, "a@test.com")?;
                let p = Patient::create(conn, n.id, &patient_data("P-001"))?;
                Ok((n.id, p.id))
            })
            .unwrap();
        (db, nid, pid)
    }

    fn reading(weight: f64, date: &str) -> ConsultationCreate {
        ConsultationCreate {
            consultation_date: Some(date.to_string()),
            weight,
            height: 165.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_consultation_has_no_weight_change() {
        let (db, nid, pid) = setup();
        let created = create_consultation(&db, nid, pid, reading(60.0, "2025-01-10"), at("2025-01-10")).unwrap();
        let c = created.consultation;

        assert_eq!(c.weight_change, None);
        assert_eq!(c.bmi, Some(22.04));
        assert_eq!(c.consultation_date, "2025-01-10 00:00:00");
        assert_eq!(c.derived.healthy_weight, Some(56.91));
        assert_eq!(c.derived.adjusted_weight, Some(57.68));
        assert!(c.derived.caloric_requirement.unwrap() > 0.0);
        assert_eq!(created.patient_activity_level, None);
    }

    #[test]
    fn test_second_consultation_records_weight_change() {
        let (db, nid, pid) = setup();
        create_consultation(&db, nid, pid, reading(60.0, "2025-01-10"), at("2025-01-10")).unwrap();
        let second = create_consultation(&db, nid, pid, reading(58.7, "2025-02-10"), at("2025-02-10")).unwrap();
        assert_eq!(second.consultation.weight_change, Some(-1.3));
    }

    #[test]
    fn test_activity_change_updates_patient() {
        let (db, nid, pid) = setup();
        let mut data = reading(60.0, "2025-01-10");
        data.activity_level_changed = true;
        data.new_activity_level = Some(ActivityLevel::VeryActive);

        let created = create_consultation(&db, nid, pid, data, at("2025-01-10")).unwrap();
        assert_eq!(created.patient_activity_level, Some(ActivityLevel::VeryActive));

        let patient = db.with_conn(|conn| Patient::get_by_id(conn, pid)).unwrap().unwrap();
        assert_eq!(patient.activity_level, ActivityLevel::VeryActive);

        let baseline = create_consultation(&db, nid, pid, reading(60.0, "2025-01-11"), at("2025-01-11")).unwrap();
        assert_eq!(
            created.consultation.derived.caloric_requirement,
            baseline.consultation.derived.caloric_requirement
        );
    }

    #[test]
    fn test_activity_change_requires_level() {
        let (db, nid, pid) = setup();
        let mut data = reading(60.0, "2025-01-10");
        data.activity_level_changed = true;
        assert!(create_consultation(&db, nid, pid, data, at("2025-01-10")).is_err());
    }

    #[test]
    fn test_foreign_nutritionist_cannot_record() {
        let (db, _, pid) = setup();
        let other = db.with_conn(|conn| nutritionist(conn, "b@test.com")).unwrap().id;
        let err = create_consultation(&db, other, pid, reading(60.0, "2025-01-10"), at("2025-01-10")).unwrap_err();
        assert_eq!(err, format!("Patient not found with id: {}", pid));
        assert!(list_consultations(&db, other, pid, 50, 0).is_err());
    }

    #[test]
    fn test_update_recomputes_bmi() {
        let (db, nid, pid) = setup();
        let created = create_consultation(&db, nid, pid, reading(60.0, "2025-01-10"), at("2025-01-10")).unwrap();

        let data = ConsultationUpdate { weight: Some(68.06), ..Default::default() };
        let updated = update_consultation(&db, nid, created.consultation.id, data).unwrap();
        assert_eq!(updated.bmi, Some(25.0));
        assert!(updated.derived.adjusted_weight.unwrap() < 68.06);

        let notes_only = ConsultationUpdate { notes: Some("Good progress".to_string()), ..Default::default() };
        let updated = update_consultation(&db, nid, created.consultation.id, notes_only).unwrap();
        assert_eq!(updated.bmi, Some(25.0));
        assert_eq!(updated.notes.as_deref(), Some("Good progress"));
    }

    #[test]
    fn test_unapplied_activity_level_is_ignored_on_update() {
        let (db, nid, pid) = setup();
        let mut data = reading(60.0, "2025-01-10");
        data.new_activity_level = Some(ActivityLevel::VeryActive);
        let created = create_consultation(&db, nid, pid, data, at("2025-01-10")).unwrap();
        assert_eq!(created.patient_activity_level, None);

        let same_weight = ConsultationUpdate { weight: Some(60.0), ..Default::default() };
        let updated = update_consultation(&db, nid, created.consultation.id, same_weight).unwrap();
        assert_eq!(
            updated.derived.caloric_requirement,
            created.consultation.derived.caloric_requirement
        );
    }

    #[test]
    fn test_effective_activity_level() {
        let patient_level = ActivityLevel::Sedentary;
        let new_level = Some(ActivityLevel::Active);
        assert_eq!(effective_activity_level(true, new_level, patient_level), ActivityLevel::Active);
        assert_eq!(effective_activity_level(false, new_level, patient_level), patient_level);
        assert_eq!(effective_activity_level(true, None, patient_level), patient_level);
    }

    #[test]
    fn test_upcoming_and_delete() {
        let (db, nid, pid) = setup();
        let mut data = reading(60.0, "2025-01-10");
        data.next_appointment = Some("2025-02-10T10:30".to_string());
        let created = create_consultation(&db, nid, pid, data, at("2025-01-10")).unwrap();

        let upcoming = upcoming_appointments(&db, nid, at("2025-01-20")).unwrap();
        assert_eq!(upcoming.total, 1);
        assert_eq!(upcoming.appointments[0].next_appointment, "2025-02-10 10:30:00");
        assert_eq!(upcoming.appointments[0].last_weight, 60.0);
        assert_eq!(upcoming_appointments(&db, nid, at("2025-03-01")).unwrap().total, 0);

        delete_consultation(&db, nid, created.consultation.id).unwrap();
        assert!(get_consultation(&db, nid, created.consultation.id).unwrap().is_none());
    }
}
