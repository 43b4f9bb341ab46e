//! Calculator MCP Tools
//!
//! Ad-hoc access to the nutrition formulas without any stored record. Labels
//! for gender, activity level and patient type are parsed leniently.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calculations::{
    calculate_adjusted_weight, calculate_age, calculate_bmi, calculate_caloric_requirement,
    calculate_ideal_weight, calculate_tmb, get_bmi_category, ActivityLevel, BmiCategory,
    CaloricRequirement, Gender, PatientType,
};
use crate::models::parse_date;

/// Response for calculate_bmi
#[derive(Debug, Serialize)]
pub struct BmiResponse {
    pub bmi: f64,
    /// Present when an age was given
    pub category: Option<BmiCategory>,
}

/// Response for calculate_ideal_weight and calculate_adjusted_weight
#[derive(Debug, Serialize)]
pub struct WeightResponse {
    pub ideal_weight: f64,
    pub adjusted_weight: Option<f64>,
}

/// Response for calculate_tmb
#[derive(Debug, Serialize)]
pub struct TmbResponse {
    pub tmb: f64,
}

/// Response for calculate_age
#[derive(Debug, Serialize)]
pub struct AgeResponse {
    pub birth_date: String,
    pub reference_date: String,
    pub age: i32,
}

fn require_positive(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("{} must be greater than 0", name));
    }
    Ok(())
}

fn require_age(age: i32) -> Result<(), String> {
    if age < 0 {
        return Err(format!("age cannot be negative, got {}", age));
    }
    Ok(())
}

/// BMI from kg and cm, with its category when `age` is known
pub fn bmi(weight_kg: f64, height_cm: f64, age: Option<i32>) -> Result<BmiResponse, String> {
    require_positive("weight", weight_kg)?;
    require_positive("height", height_cm)?;
    if let Some(a) = age {
        require_age(a)?;
    }

    let bmi = calculate_bmi(weight_kg, height_cm);
    Ok(BmiResponse {
        bmi,
        category: age.map(|a| get_bmi_category(bmi, a)),
    })
}

/// Ideal weight, plus the adjusted weight when a current weight is given
pub fn ideal_weight(height_cm: f64, gender: &str, current_weight_kg: Option<f64>) -> Result<WeightResponse, String> {
    require_positive("height", height_cm)?;
    if let Some(w) = current_weight_kg {
        require_positive("weight", w)?;
    }

    let ideal = calculate_ideal_weight(height_cm, Gender::from_str(gender));
    Ok(WeightResponse {
        ideal_weight: ideal,
        adjusted_weight: current_weight_kg.map(|w| calculate_adjusted_weight(w, ideal)),
    })
}

/// Basal metabolic rate
pub fn tmb(weight_kg: f64, height_cm: f64, age: i32, gender: &str) -> Result<TmbResponse, String> {
    require_positive("weight", weight_kg)?;
    require_positive("height", height_cm)?;
    require_age(age)?;

    Ok(TmbResponse {
        tmb: calculate_tmb(weight_kg, height_cm, age, Gender::from_str(gender)),
    })
}

/// Daily caloric requirement with macro split
pub fn caloric_requirement(
    weight_kg: f64,
    height_cm: f64,
    age: i32,
    gender: &str,
    activity_level: &str,
    patient_type: &str,
) -> Result<CaloricRequirement, String> {
    require_positive("weight", weight_kg)?;
    require_positive("height", height_cm)?;
    require_age(age)?;

    Ok(calculate_caloric_requirement(
        weight_kg,
        height_cm,
        age,
        Gender::from_str(gender),
        ActivityLevel::from_str(activity_level),
        PatientType::from_str(patient_type),
    ))
}

/// Age in whole years on `reference` (defaults to `today`)
pub fn age(birth_date: &str, reference: Option<&str>, today: NaiveDate) -> Result<AgeResponse, String> {
    let birth = parse_date(birth_date)
        .ok_or_else(|| format!("Invalid birth_date '{}', expected YYYY-MM-DD", birth_date))?;
    let reference = match reference {
        Some(r) => parse_date(r).ok_or_else(|| format!("Invalid reference_date '{}', expected YYYY-MM-DD", r))?,
        None => today,
    };

    Ok(AgeResponse {
        birth_date: birth.to_string(),
        reference_date: reference.to_string(),
        age: calculate_age(birth, reference),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_with_and_without_age() {
        let r = bmi(70.0, 175.0, Some(30)).unwrap();
        assert_eq!(r.bmi, 22.86);
        assert_eq!(r.category, Some(BmiCategory::Normal));

        assert_eq!(bmi(70.0, 175.0, None).unwrap().category, None);
        assert!(bmi(0.0, 175.0, None).is_err());
        assert!(bmi(70.0, -1.0, None).is_err());
        assert!(bmi(70.0, 175.0, Some(-2)).is_err());
    }

    #[test]
    fn test_ideal_and_adjusted_weight() {
        let r = ideal_weight(175.0, "male", None).unwrap();
        assert_eq!(r.ideal_weight, 70.46);
        assert_eq!(r.adjusted_weight, None);

        let r = ideal_weight(175.0, "masculino", Some(100.0)).unwrap();
        assert!(r.adjusted_weight.unwrap() > 70.46 && r.adjusted_weight.unwrap() < 100.0);

        let r = ideal_weight(175.0, "male", Some(60.0)).unwrap();
        assert_eq!(r.adjusted_weight, Some(60.0));
    }

    #[test]
    fn test_tmb_and_requirement() {
        assert_eq!(tmb(70.0, 175.0, 30, "male").unwrap().tmb, 1695.67);

        let req = caloric_requirement(70.0, 175.0, 30, "male", "moderate", "healthy").unwrap();
        assert_eq!(req.proteins_g, 70.0);
        assert!(req.caloric_requirement > req.tmb);

        let pregnant = caloric_requirement(60.0, 165.0, 30, "female", "light", "pregnant").unwrap();
        let healthy = caloric_requirement(60.0, 165.0, 30, "female", "light", "healthy").unwrap();
        assert!(pregnant.caloric_requirement > healthy.caloric_requirement);
    }

    #[test]
    fn test_age_reference_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        assert_eq!(age("1990-06-15", None, today).unwrap().age, 34);
        assert_eq!(age("1990-06-15", Some("2025-06-15"), today).unwrap().age, 35);
        assert!(age("15/06/1990", None, today).is_err());
    }
}
