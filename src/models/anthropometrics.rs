//! Optional body measurements
//!
//! Shared by patients (baseline) and consultations (follow-up readings).

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Body composition, circumferences (cm) and skinfolds (mm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Anthropometrics {
    pub body_fat_percentage: Option<f64>,
    pub muscle_mass: Option<f64>,          // kg
    pub waist_circumference: Option<f64>,
    pub hip_circumference: Option<f64>,
    pub arm_circumference: Option<f64>,
    pub thigh_circumference: Option<f64>,
    pub calf_circumference: Option<f64>,
    pub triceps_skinfold: Option<f64>,
    pub biceps_skinfold: Option<f64>,
    pub subscapular_skinfold: Option<f64>,
    pub suprailiac_skinfold: Option<f64>,
    pub abdominal_skinfold: Option<f64>,
}

impl Anthropometrics {
    /// Column names, in the order of [`Anthropometrics::values`]
    pub const COLUMNS: [&'static str; 12] = [
        "body_fat_percentage",
        "muscle_mass",
        "waist_circumference",
        "hip_circumference",
        "arm_circumference",
        "thigh_circumference",
        "calf_circumference",
        "triceps_skinfold",
        "biceps_skinfold",
        "subscapular_skinfold",
        "suprailiac_skinfold",
        "abdominal_skinfold",
    ];

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            body_fat_percentage: row.get("body_fat_percentage")?,
            muscle_mass: row.get("muscle_mass")?,
            waist_circumference: row.get("waist_circumference")?,
            hip_circumference: row.get("hip_circumference")?,
            arm_circumference: row.get("arm_circumference")?,
            thigh_circumference: row.get("thigh_circumference")?,
            calf_circumference: row.get("calf_circumference")?,
            triceps_skinfold: row.get("triceps_skinfold")?,
            biceps_skinfold: row.get("biceps_skinfold")?,
            subscapular_skinfold: row.get("subscapular_skinfold")?,
            suprailiac_skinfold: row.get("suprailiac_skinfold")?,
            abdominal_skinfold: row.get("abdominal_skinfold")?,
        })
    }

    pub fn values(&self) -> [Option<f64>; 12] {
        [
            self.body_fat_percentage,
            self.muscle_mass,
            self.waist_circumference,
            self.hip_circumference,
            self.arm_circumference,
            self.thigh_circumference,
            self.calf_circumference,
            self.triceps_skinfold,
            self.biceps_skinfold,
            self.subscapular_skinfold,
            self.suprailiac_skinfold,
            self.abdominal_skinfold,
        ]
    }

    /// Columns that carry a value, paired with it
    pub fn present(&self) -> impl Iterator<Item = (&'static str, f64)> {
        Self::COLUMNS
            .into_iter()
            .zip(self.values())
            .filter_map(|(col, val)| val.map(|v| (col, v)))
    }

    /// Waist-to-hip ratio when both circumferences are known
    pub fn waist_hip_ratio(&self) -> Option<f64> {
        match (self.waist_circumference, self.hip_circumference) {
            (Some(waist), Some(hip)) if hip > 0.0 => Some((waist / hip * 100.0).round() / 100.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_skips_missing() {
        let a = Anthropometrics {
            muscle_mass: Some(30.5),
            abdominal_skinfold: Some(12.0),
            ..Default::default()
        };
        let present: Vec<_> = a.present().collect();
        assert_eq!(present, vec![("muscle_mass", 30.5), ("abdominal_skinfold", 12.0)]);
    }

    #[test]
    fn test_waist_hip_ratio() {
        let a = Anthropometrics {
            waist_circumference: Some(80.0),
            hip_circumference: Some(100.0),
            ..Default::default()
        };
        assert_eq!(a.waist_hip_ratio(), Some(0.8));
        assert_eq!(Anthropometrics::default().waist_hip_ratio(), None);
    }
}
