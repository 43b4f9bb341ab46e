//! Recompute BMI and derived figures for stored consultations
//! Usage: cargo run --bin recalculate_consultations -- [patient_id]

use std::collections::HashMap;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nutriclinic::config;
use nutriclinic::db::{self, Database};
use nutriclinic::models::{parse_datetime, Consultation, Patient};
use nutriclinic::tools::consultations::{derive_figures, effective_activity_level};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriclinic=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let only_patient: Option<i64> = match std::env::args().nth(1) {
        Some(arg) => Some(arg.parse()?),
        None => None,
    };

    let db_path = config::get_database_path();
    println!("Database: {}", db_path.display());

    let database = Database::new(&db_path)?;

    database.with_conn(db::migrations::run_migrations)?;

    let (checked, changed) = database.with_transaction(|conn| {
        let mut patients: HashMap<i64, Option<Patient>> = HashMap::new();
        let mut checked = 0usize;
        let mut changed = 0usize;

        for consultation in Consultation::list_all(conn)? {
            if only_patient.is_some_and(|id| id != consultation.patient_id) {
                continue;
            }

            if !patients.contains_key(&consultation.patient_id) {
                let patient = Patient::get_by_id(conn, consultation.patient_id)?;
                patients.insert(consultation.patient_id, patient);
            }
            let Some(Some(patient)) = patients.get(&consultation.patient_id) else {
                warn!(consultation_id = consultation.id, "Skipping consultation without patient");
                continue;
            };

            let Some(on_date) = parse_datetime(&consultation.consultation_date).map(|dt| dt.date()) else {
                warn!(
                    consultation_id = consultation.id,
                    date = %consultation.consultation_date,
                    "Skipping consultation with unreadable date"
                );
                continue;
            };

            let activity_level = effective_activity_level(
                consultation.activity_level_changed,
                consultation.new_activity_level,
                patient.activity_level,
            );
            let (bmi, derived) =
                derive_figures(patient, consultation.weight, consultation.height, activity_level, on_date);
            checked += 1;

            if consultation.bmi == Some(bmi) && consultation.derived == derived {
                continue;
            }

            println!(
                "Consultation {} ({}): BMI {:?} -> {:.2}, requirement {:?} -> {:?}",
                consultation.id,
                consultation.consultation_date,
                consultation.bmi,
                bmi,
                consultation.derived.caloric_requirement,
                derived.caloric_requirement,
            );
            Consultation::set_derived(conn, consultation.id, bmi, &derived)?;
            changed += 1;
        }

        Ok((checked, changed))
    })?;

    info!(checked, changed, "Recalculation finished");
    println!("Checked {} consultations, updated {}", checked, changed);

    Ok(())
}
