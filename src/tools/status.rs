//! NutriClinic Status Tool
//!
//! Provides runtime status information about the NutriClinic service, and the
//! usage guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Clinical workflow instructions for AI assistants
pub const CLINIC_INSTRUCTIONS: &str = r#"
# NutriClinic Usage Guide

NutriClinic keeps clinical nutrition records for nutritionists: patients,
follow-up consultations, meal plans, and shared catalogs of menus, food
exchanges and snacks. Every patient-scoped tool takes the acting
`nutritionist_id`; patients of other nutritionists are reported as not found.

## Accounts and subscriptions

1. `register_nutritionist` creates an account on a 30-day trial.
2. `subscription_status` reports the plan, whether access is active, and the
   patient count against the plan limit.
3. `upgrade_subscription` switches to `basic` (50 patients), `professional`
   (200) or `enterprise` (unlimited) for 30 days.

A trial allows 3 patients. Creating and listing patients requires an active
trial or subscription.

## Patients

- `create_patient` needs first/last name, identification (unique per
  nutritionist), birth date (YYYY-MM-DD), gender, weight (kg) and height (cm).
- `patient_calculations` returns age, BMI and category, ideal and adjusted
  weight, basal metabolic rate and the daily caloric requirement with its
  macro split. For BMI >= 25 the adjusted weight is used.

## Consultations

`create_consultation` records a follow-up reading. The server computes:

| Figure | Source |
|--------|--------|
| BMI | consultation weight and height |
| weight_change | against the previous consultation |
| healthy_weight | Devine formula from height |
| adjusted_weight | ideal + 25% of the excess |
| caloric_requirement | Harris-Benedict x activity x stress |

Set `activity_level_changed` with `new_activity_level` when the patient
reports a new routine; the patient's stored level is updated too.

Use `upcoming_appointments` to see scheduled follow-ups.

## Meal plans

`create_meal_plan` takes a list of items (meal_time, food_item, portion,
calories, proteins, carbohydrates, fats). Totals are always the sums of the
items. `replace_meal_plan` swaps the header and the whole item list.

## Preferences

One set per patient. Taste scores run from 1 to 5.
`patient_recommendations` builds suggestion blocks from budget, cooking time,
taste scores, cooking methods, allergies and the patient's diabetes or
hypertension flags.

## Ad-hoc calculations

`calculate_bmi`, `calculate_ideal_weight`, `calculate_adjusted_weight`,
`calculate_tmb`, `calculate_caloric_requirement` and `calculate_age` work
without any stored record.
"#;

/// Runtime status of the NutriClinic service
#[derive(Debug, Serialize)]
pub struct NutriClinicStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> NutriClinicStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriClinicStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_missing_database() {
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/nutriclinic.db"));
        let status = tracker.get_status();
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
        assert!(status.database_path.ends_with("nutriclinic.db"));
    }

    #[test]
    fn test_instructions_mention_core_tools() {
        for tool in ["create_patient", "create_consultation", "create_meal_plan", "patient_recommendations"] {
            assert!(CLINIC_INSTRUCTIONS.contains(tool), "missing {}", tool);
        }
    }
}
