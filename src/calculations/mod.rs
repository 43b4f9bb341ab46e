//! Nutrition calculation module
//!
//! Anthropometric and energy-requirement formulas used by patients and
//! consultations. Pure functions only; no database access.

pub mod assessment;
pub mod classify;
pub mod formulas;

pub use assessment::{assess, Assessment, BodyProfile, ADJUSTED_WEIGHT_BMI_THRESHOLD};
pub use classify::{ActivityLevel, BmiCategory, Gender, PatientType};
pub use formulas::{
    calculate_adjusted_weight, calculate_age, calculate_age_today, calculate_bmi,
    calculate_caloric_requirement, calculate_ideal_weight, calculate_tmb, get_activity_factor,
    get_bmi_category, get_stress_factor, round2, today, CaloricRequirement,
};
