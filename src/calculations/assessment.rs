//! Nutritional assessment for a stored patient
//!
//! Combines the individual formulas the way consultations and the patient
//! calculations tool use them.

use chrono::NaiveDate;
use serde::Serialize;

use super::classify::{ActivityLevel, BmiCategory, Gender, PatientType};
use super::formulas::{
    calculate_adjusted_weight, calculate_age, calculate_bmi, calculate_caloric_requirement,
    calculate_ideal_weight, get_bmi_category, CaloricRequirement,
};

/// BMI at or above which the adjusted weight drives the energy calculation
pub const ADJUSTED_WEIGHT_BMI_THRESHOLD: f64 = 25.0;

/// Inputs needed to assess a patient
#[derive(Debug, Clone, Copy)]
pub struct BodyProfile {
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    pub patient_type: PatientType,
}

/// Full set of derived figures for a patient
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub age: i32,
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub ideal_weight: f64,
    pub adjusted_weight: f64,
    /// Weight fed into the caloric requirement
    pub weight_used: f64,
    #[serde(flatten)]
    pub requirement: CaloricRequirement,
}

/// Assess a patient as of `reference`
pub fn assess(profile: &BodyProfile, reference: NaiveDate) -> Assessment {
    let age = calculate_age(profile.birth_date, reference);
    let bmi = calculate_bmi(profile.weight_kg, profile.height_cm);
    let ideal_weight = calculate_ideal_weight(profile.height_cm, profile.gender);
    let adjusted_weight = calculate_adjusted_weight(profile.weight_kg, ideal_weight);

    let weight_used = if bmi >= ADJUSTED_WEIGHT_BMI_THRESHOLD {
        adjusted_weight
    } else {
        profile.weight_kg
    };

    let requirement = calculate_caloric_requirement(
        weight_used,
        profile.height_cm,
        age,
        profile.gender,
        profile.activity_level,
        profile.patient_type,
    );

    Assessment {
        age,
        bmi,
        bmi_category: get_bmi_category(bmi, age),
        ideal_weight,
        adjusted_weight,
        weight_used,
        requirement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(weight_kg: f64) -> BodyProfile {
        BodyProfile {
            birth_date: NaiveDate::from_ymd_opt(1995, 3, 10).unwrap(),
            gender: Gender::Male,
            weight_kg,
            height_cm: 175.0,
            activity_level: ActivityLevel::Moderate,
            patient_type: PatientType::Healthy,
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_normal_weight_uses_actual_weight() {
        let a = assess(&profile(70.0), reference());
        assert_eq!(a.age, 30);
        assert_eq!(a.bmi, 22.86);
        assert_eq!(a.bmi_category, BmiCategory::Normal);
        assert_eq!(a.weight_used, 70.0);
        assert_eq!(a.requirement.tmb, 1695.67);
    }

    #[test]
    fn test_overweight_uses_adjusted_weight() {
        let a = assess(&profile(98.46), reference());
        assert!(a.bmi >= ADJUSTED_WEIGHT_BMI_THRESHOLD);
        assert_eq!(a.ideal_weight, 70.46);
        assert_eq!(a.adjusted_weight, 77.46);
        assert_eq!(a.weight_used, a.adjusted_weight);
        assert_eq!(a.requirement.proteins_g, 77.46);
    }

    #[test]
    fn test_assessment_serializes_flat() {
        let a = assess(&profile(70.0), reference());
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["bmi_category"], "Normal");
        assert_eq!(json["caloric_requirement"], a.requirement.caloric_requirement);
    }
}
