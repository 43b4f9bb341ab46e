//! Anthropometric and energy formulas
//!
//! Every function here is pure. Inputs are expected to be validated by the
//! caller (positive height and weight); nothing is clamped or rejected.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::classify::{ActivityLevel, BmiCategory, Gender, PatientType};

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;
/// Devine floor for ideal weight, in kg
pub const MIN_IDEAL_WEIGHT_KG: f64 = 45.0;
/// Share of excess weight counted by the adjusted weight
pub const ADJUSTED_WEIGHT_FRACTION: f64 = 0.25;
/// Extra daily kcal for pregnancy (trimester average)
pub const PREGNANCY_EXTRA_KCAL: f64 = 300.0;
/// Multiplier applied on top of the stress factor for athletes
pub const ATHLETE_MULTIPLIER: f64 = 1.1;
/// Fraction of total energy assigned to fat
pub const FAT_ENERGY_SHARE: f64 = 0.275;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Daily energy requirement with macronutrient split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaloricRequirement {
    pub tmb: f64,
    pub caloric_requirement: f64,
    pub proteins_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub activity_factor: f64,
    pub stress_factor: f64,
}

/// Round to 2 decimal places. Exact ties go to the even digit.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Whole years between `birth_date` and `reference`.
///
/// A birth date after `reference` yields a negative age.
pub fn calculate_age(birth_date: NaiveDate, reference: NaiveDate) -> i32 {
    let birthday_pending =
        (reference.month(), reference.day()) < (birth_date.month(), birth_date.day());
    reference.year() - birth_date.year() - i32::from(birthday_pending)
}

/// Current UTC date
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Age as of the current UTC date
pub fn calculate_age_today(birth_date: NaiveDate) -> i32 {
    calculate_age(birth_date, today())
}

/// Body mass index from kg and cm
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / (height_m * height_m))
}

/// Categorize a BMI using the band for the given age
pub fn get_bmi_category(bmi: f64, age: i32) -> BmiCategory {
    if age < 18 {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    } else if age < 65 {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else if bmi < 35.0 {
            BmiCategory::ObeseI
        } else if bmi < 40.0 {
            BmiCategory::ObeseII
        } else {
            BmiCategory::ObeseIII
        }
    } else if bmi < 23.0 {
        BmiCategory::Underweight
    } else if bmi < 28.0 {
        BmiCategory::Normal
    } else if bmi < 33.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// Ideal body weight (Devine), floored at 45 kg
pub fn calculate_ideal_weight(height_cm: f64, gender: Gender) -> f64 {
    let inches_over_five_feet = height_cm / CM_PER_INCH - 60.0;
    let base = if gender.is_male() { 50.0 } else { 45.5 };
    let ideal = base + 2.3 * inches_over_five_feet;
    round2(ideal.max(MIN_IDEAL_WEIGHT_KG))
}

/// Adjusted body weight. Identity when not above ideal.
pub fn calculate_adjusted_weight(current_weight: f64, ideal_weight: f64) -> f64 {
    if current_weight <= ideal_weight {
        return current_weight;
    }
    round2(ideal_weight + ADJUSTED_WEIGHT_FRACTION * (current_weight - ideal_weight))
}

/// Basal metabolic rate (revised Harris-Benedict), kcal/day
pub fn calculate_tmb(weight_kg: f64, height_cm: f64, age: i32, gender: Gender) -> f64 {
    let age = f64::from(age);
    let tmb = if gender.is_male() {
        88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age
    } else {
        447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age
    };
    round2(tmb)
}

pub fn get_activity_factor(activity_level: ActivityLevel) -> f64 {
    activity_level.factor()
}

pub fn get_stress_factor(patient_type: PatientType) -> f64 {
    patient_type.stress_factor()
}

/// Total daily energy requirement and macronutrient split.
///
/// Carbohydrates take whatever energy protein and fat leave over and can go
/// negative for very high protein targets.
pub fn calculate_caloric_requirement(
    weight_kg: f64,
    height_cm: f64,
    age: i32,
    gender: Gender,
    activity_level: ActivityLevel,
    patient_type: PatientType,
) -> CaloricRequirement {
    let tmb = calculate_tmb(weight_kg, height_cm, age, gender);
    let activity_factor = get_activity_factor(activity_level);
    let stress_factor = get_stress_factor(patient_type);

    let mut total = tmb * activity_factor * stress_factor;
    match patient_type {
        PatientType::Pregnant => total += PREGNANCY_EXTRA_KCAL,
        PatientType::Athlete => total *= ATHLETE_MULTIPLIER,
        _ => {}
    }

    let proteins_g = weight_kg * patient_type.protein_per_kg();
    let proteins_kcal = proteins_g * KCAL_PER_G_PROTEIN;

    let fats_kcal = total * FAT_ENERGY_SHARE;
    let fats_g = fats_kcal / KCAL_PER_G_FAT;

    let carbs_kcal = total - proteins_kcal - fats_kcal;
    let carbs_g = carbs_kcal / KCAL_PER_G_CARB;

    CaloricRequirement {
        tmb: round2(tmb),
        caloric_requirement: round2(total),
        proteins_g: round2(proteins_g),
        carbs_g: round2(carbs_g),
        fats_g: round2(fats_g),
        activity_factor,
        stress_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn macro_kcal(req: &CaloricRequirement) -> f64 {
        req.proteins_g * KCAL_PER_G_PROTEIN + req.carbs_g * KCAL_PER_G_CARB + req.fats_g * KCAL_PER_G_FAT
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        assert_eq!(calculate_age(date("1990-06-15"), date("2025-06-14")), 34);
        assert_eq!(calculate_age(date("1990-06-15"), date("2025-06-15")), 35);
        assert_eq!(calculate_age(date("1990-06-15"), date("2025-12-01")), 35);
    }

    #[test]
    fn test_age_future_birth_date_is_negative() {
        assert_eq!(calculate_age(date("2030-01-01"), date("2025-06-01")), -5);
    }

    #[test]
    fn test_age_leap_day_birthday() {
        // Feb 29 birthday has not passed on Feb 28 of a non-leap year
        assert_eq!(calculate_age(date("2000-02-29"), date("2023-02-28")), 22);
        assert_eq!(calculate_age(date("2000-02-29"), date("2023-03-01")), 23);
    }

    #[test]
    fn test_bmi_reference_value() {
        assert_eq!(calculate_bmi(70.0, 175.0), 22.86);
    }

    #[test]
    fn test_bmi_scales_with_weight() {
        let single = calculate_bmi(64.0, 160.0);
        let double = calculate_bmi(128.0, 160.0);
        assert_eq!(single, 25.0);
        assert_eq!(double, 2.0 * single);
    }

    #[test]
    fn test_bmi_category_adult_band() {
        assert_eq!(get_bmi_category(22.0, 30), BmiCategory::Normal);
        assert_eq!(get_bmi_category(31.0, 30), BmiCategory::ObeseI);
        assert_eq!(get_bmi_category(18.49, 30), BmiCategory::Underweight);
        assert_eq!(get_bmi_category(25.0, 30), BmiCategory::Overweight);
        assert_eq!(get_bmi_category(35.0, 30), BmiCategory::ObeseII);
        assert_eq!(get_bmi_category(40.0, 64), BmiCategory::ObeseIII);
    }

    #[test]
    fn test_bmi_category_minor_band() {
        assert_eq!(get_bmi_category(17.0, 12), BmiCategory::Underweight);
        assert_eq!(get_bmi_category(29.9, 17), BmiCategory::Overweight);
        assert_eq!(get_bmi_category(45.0, 17), BmiCategory::Obese);
    }

    #[test]
    fn test_bmi_category_elderly_band() {
        assert_eq!(get_bmi_category(24.0, 70), BmiCategory::Normal);
        assert_eq!(get_bmi_category(22.9, 65), BmiCategory::Underweight);
        assert_eq!(get_bmi_category(30.0, 80), BmiCategory::Overweight);
        assert_eq!(get_bmi_category(33.0, 80), BmiCategory::Obese);
    }

    #[test]
    fn test_ideal_weight_devine() {
        assert_eq!(calculate_ideal_weight(175.0, Gender::Male), 70.46);
        assert_eq!(calculate_ideal_weight(165.0, Gender::Female), 56.91);
    }

    #[test]
    fn test_ideal_weight_other_uses_female_branch() {
        assert_eq!(
            calculate_ideal_weight(170.0, Gender::Other),
            calculate_ideal_weight(170.0, Gender::Female)
        );
    }

    #[test]
    fn test_ideal_weight_floor() {
        assert_eq!(calculate_ideal_weight(140.0, Gender::Female), 45.0);
        assert_eq!(calculate_ideal_weight(100.0, Gender::Male), 45.0);
    }

    #[test]
    fn test_adjusted_weight() {
        assert_eq!(calculate_adjusted_weight(60.0, 70.46), 60.0);
        assert_eq!(calculate_adjusted_weight(70.46, 70.46), 70.46);

        let adjusted = calculate_adjusted_weight(110.0, 70.0);
        assert_eq!(adjusted, 80.0);
        assert!(adjusted > 70.0 && adjusted < 110.0);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(70.125), 70.12);
        assert_eq!(round2(71.125), 71.12);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(1.115), 1.11);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(-1.3), -1.3);
        assert_eq!(calculate_adjusted_weight(70.5, 70.0), 70.12);
    }

    #[test]
    fn test_age_today_uses_utc_date() {
        let birth = NaiveDate::from_ymd_opt(1990, 5, 14).unwrap();
        assert_eq!(calculate_age_today(birth), calculate_age(birth, today()));
    }

    #[test]
    fn test_tmb_harris_benedict() {
        assert_eq!(calculate_tmb(70.0, 175.0, 30, Gender::Male), 1695.67);
        // 447.593 + 554.82 + 511.17 - 129.9
        assert_eq!(calculate_tmb(60.0, 165.0, 30, Gender::Female), 1383.68);
    }

    #[test]
    fn test_caloric_requirement_moderate_healthy_male() {
        let req = calculate_caloric_requirement(
            70.0,
            175.0,
            30,
            Gender::from_str("male"),
            ActivityLevel::from_str("moderado"),
            PatientType::from_str("sano"),
        );

        assert_eq!(req.tmb, 1695.67);
        assert_eq!(req.activity_factor, 1.55);
        assert_eq!(req.stress_factor, 1.0);
        assert_eq!(req.caloric_requirement, 2628.29);
        assert_eq!(req.proteins_g, 70.0);
        assert_eq!(req.fats_g, round2(2628.2885 * FAT_ENERGY_SHARE / 9.0));
        assert!((macro_kcal(&req) - req.caloric_requirement).abs() < 0.1);
    }

    #[test]
    fn test_pregnancy_adds_flat_300() {
        let weight = 65.0;
        let tmb = calculate_tmb(weight, 162.0, 28, Gender::Female);
        let req = calculate_caloric_requirement(
            weight,
            162.0,
            28,
            Gender::Female,
            ActivityLevel::Light,
            PatientType::Pregnant,
        );
        let expected = round2(tmb * 1.375 * 1.15 + 300.0);
        assert_eq!(req.caloric_requirement, expected);
        assert_eq!(req.proteins_g, 65.0);
    }

    #[test]
    fn test_athlete_multiplies_by_1_1() {
        let tmb = calculate_tmb(80.0, 180.0, 25, Gender::Male);
        let req = calculate_caloric_requirement(
            80.0,
            180.0,
            25,
            Gender::Male,
            ActivityLevel::VeryActive,
            PatientType::Athlete,
        );
        assert_eq!(req.caloric_requirement, round2(tmb * 1.9 * 1.3 * 1.1));
        assert_eq!(req.proteins_g, 144.0);
    }

    #[test]
    fn test_elderly_protein_target() {
        let req = calculate_caloric_requirement(
            60.0,
            160.0,
            75,
            Gender::Female,
            ActivityLevel::Sedentary,
            PatientType::Elderly,
        );
        assert_eq!(req.proteins_g, 72.0);
        assert_eq!(req.stress_factor, 1.0);
    }

    #[test]
    fn test_negative_carbs_are_not_clamped() {
        // Extreme inputs leave no energy for carbohydrates
        let req = calculate_caloric_requirement(
            100.0,
            50.0,
            200,
            Gender::Male,
            ActivityLevel::Sedentary,
            PatientType::Athlete,
        );
        assert!(req.carbs_g < 0.0);
    }

    #[test]
    fn test_functions_are_idempotent() {
        let first = calculate_caloric_requirement(
            72.5,
            168.0,
            41,
            Gender::Other,
            ActivityLevel::Active,
            PatientType::Hospitalized,
        );
        let second = calculate_caloric_requirement(
            72.5,
            168.0,
            41,
            Gender::Other,
            ActivityLevel::Active,
            PatientType::Hospitalized,
        );
        assert_eq!(first, second);
        assert_eq!(calculate_bmi(72.5, 168.0), calculate_bmi(72.5, 168.0));
    }
}
