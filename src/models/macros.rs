//! Shared macronutrient totals
//!
//! Used by meal plan items and meal plan totals.

use serde::{Deserialize, Serialize};

/// Energy and macronutrients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macros {
    pub calories: f64,
    pub proteins: f64,      // grams
    pub carbohydrates: f64, // grams
    pub fats: f64,          // grams
}

impl Macros {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Round every value to 2 decimals
    pub fn rounded(&self) -> Self {
        let r = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            calories: r(self.calories),
            proteins: r(self.proteins),
            carbohydrates: r(self.carbohydrates),
            fats: r(self.fats),
        }
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, other: Macros) -> Macros {
        Macros {
            calories: self.calories + other.calories,
            proteins: self.proteins + other.proteins,
            carbohydrates: self.carbohydrates + other.carbohydrates,
            fats: self.fats + other.fats,
        }
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Macros::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        let items = [
            Macros { calories: 100.5, proteins: 10.0, carbohydrates: 5.0, fats: 2.0 },
            Macros { calories: 200.25, proteins: 1.0, carbohydrates: 40.0, fats: 0.5 },
        ];
        let total: Macros = items.into_iter().sum();
        assert_eq!(total, Macros { calories: 300.75, proteins: 11.0, carbohydrates: 45.0, fats: 2.5 });
        assert_eq!([].into_iter().sum::<Macros>(), Macros::zero());
    }
}
