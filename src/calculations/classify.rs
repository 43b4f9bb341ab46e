//! Classification enums and factor tables
//!
//! Gender, activity level, patient type, and BMI category. Parsing never
//! fails: unknown labels fall back to a fixed default variant.

use serde::{Deserialize, Serialize};

/// Gender, used only to pick a formula branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse a gender label. Anything that is not male or female is `Other`,
    /// which the formulas treat like female.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "masculino" | "m" => Gender::Male,
            "female" | "femenino" | "f" => Gender::Female,
            _ => Gender::Other,
        }
    }

    pub fn is_male(&self) -> bool {
        matches!(self, Gender::Male)
    }
}

/// Physical activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    /// Parse an activity label, defaulting to `Moderate`
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sedentary" | "sedentario" => ActivityLevel::Sedentary,
            "light" | "ligero" => ActivityLevel::Light,
            "moderate" | "moderado" => ActivityLevel::Moderate,
            "active" | "activo" => ActivityLevel::Active,
            "very_active" | "muy_activo" => ActivityLevel::VeryActive,
            _ => ActivityLevel::Moderate,
        }
    }

    /// Multiplier from basal to total energy expenditure
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Patient type / clinical condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatientType {
    #[default]
    Healthy,
    Hospitalized,
    Icu,
    Athlete,
    Adolescent,
    Elderly,
    Pregnant,
}

impl PatientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientType::Healthy => "healthy",
            PatientType::Hospitalized => "hospitalized",
            PatientType::Icu => "icu",
            PatientType::Athlete => "athlete",
            PatientType::Adolescent => "adolescent",
            PatientType::Elderly => "elderly",
            PatientType::Pregnant => "pregnant",
        }
    }

    /// Parse a patient type label, defaulting to `Healthy`
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "healthy" | "sano" => PatientType::Healthy,
            "hospitalized" | "hospitalizado" => PatientType::Hospitalized,
            "icu" | "uci" => PatientType::Icu,
            "athlete" | "deportista" => PatientType::Athlete,
            "adolescent" | "adolescente" => PatientType::Adolescent,
            "elderly" | "adulto_mayor" => PatientType::Elderly,
            "pregnant" | "embarazada" => PatientType::Pregnant,
            _ => PatientType::Healthy,
        }
    }

    /// Multiplier for metabolic stress of the condition
    pub fn stress_factor(&self) -> f64 {
        match self {
            PatientType::Healthy => 1.0,
            PatientType::Hospitalized => 1.2,
            PatientType::Icu => 1.5,
            PatientType::Athlete => 1.3,
            PatientType::Adolescent => 1.15,
            PatientType::Elderly => 1.0,
            PatientType::Pregnant => 1.15,
        }
    }

    /// Daily protein target in grams per kg of body weight
    pub fn protein_per_kg(&self) -> f64 {
        match self {
            PatientType::Athlete => 1.8,
            PatientType::Elderly => 1.2,
            _ => 1.0,
        }
    }
}

/// BMI category label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
    #[serde(rename = "Obese I")]
    ObeseI,
    #[serde(rename = "Obese II")]
    ObeseII,
    #[serde(rename = "Obese III")]
    ObeseIII,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
            BmiCategory::ObeseI => "Obese I",
            BmiCategory::ObeseII => "Obese II",
            BmiCategory::ObeseIII => "Obese III",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!(Gender::from_str("MALE"), Gender::Male);
        assert_eq!(Gender::from_str("masculino"), Gender::Male);
        assert_eq!(Gender::from_str("Femenino"), Gender::Female);
        assert_eq!(Gender::from_str("otro"), Gender::Other);
        assert_eq!(Gender::from_str(""), Gender::Other);
        assert!(!Gender::from_str("female").is_male());
    }

    #[test]
    fn test_activity_factor_table() {
        assert_eq!(ActivityLevel::from_str("sedentary").factor(), 1.2);
        assert_eq!(ActivityLevel::from_str("ligero").factor(), 1.375);
        assert_eq!(ActivityLevel::from_str("moderado").factor(), 1.55);
        assert_eq!(ActivityLevel::from_str("Active").factor(), 1.725);
        assert_eq!(ActivityLevel::from_str("muy_activo").factor(), 1.9);
    }

    #[test]
    fn test_unknown_activity_defaults_to_moderate() {
        assert_eq!(ActivityLevel::from_str("couch"), ActivityLevel::Moderate);
        assert_eq!(ActivityLevel::from_str("couch").factor(), 1.55);
    }

    #[test]
    fn test_stress_factor_table() {
        assert_eq!(PatientType::from_str("sano").stress_factor(), 1.0);
        assert_eq!(PatientType::from_str("hospitalizado").stress_factor(), 1.2);
        assert_eq!(PatientType::from_str("UCI").stress_factor(), 1.5);
        assert_eq!(PatientType::from_str("deportista").stress_factor(), 1.3);
        assert_eq!(PatientType::from_str("adolescente").stress_factor(), 1.15);
        assert_eq!(PatientType::from_str("adulto_mayor").stress_factor(), 1.0);
        assert_eq!(PatientType::from_str("embarazada").stress_factor(), 1.15);
        assert_eq!(PatientType::from_str("unknown"), PatientType::Healthy);
    }

    #[test]
    fn test_labels_round_trip_through_as_str() {
        for level in [
            ActivityLevel::Sedentary,
            ActivityLevel::Light,
            ActivityLevel::Moderate,
            ActivityLevel::Active,
            ActivityLevel::VeryActive,
        ] {
            assert_eq!(ActivityLevel::from_str(level.as_str()), level);
        }
        assert_eq!(PatientType::from_str(PatientType::Icu.as_str()), PatientType::Icu);
    }

    #[test]
    fn test_bmi_category_serializes_as_label() {
        let json = serde_json::to_string(&BmiCategory::ObeseII).unwrap();
        assert_eq!(json, "\"Obese II\"");
        assert_eq!(BmiCategory::ObeseI.to_string(), "Obese I");
    }
}
