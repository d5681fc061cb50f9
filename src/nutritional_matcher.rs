use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::debug;

use crate::api_connection::endpoints::FoodNutrientEntry;
use crate::api_connection::NutrientDatabase;
use crate::error::NutritionError;

/// Macro-nutrients per 100 g of one food.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutrientProfile {
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sodium_mg: f64,
}

impl NutrientProfile {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            kcal: self.kcal * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
            fiber_g: self.fiber_g * factor,
            sodium_mg: self.sodium_mg * factor,
        }
    }

    /// Contribution of `grams` of this food.
    pub fn for_grams(&self, grams: f64) -> Self {
        self.scaled(grams / 100.0)
    }

    fn slot(&mut self, field: NutrientField) -> &mut f64 {
        match field {
            NutrientField::Kcal => &mut self.kcal,
            NutrientField::Protein => &mut self.protein_g,
            NutrientField::Carbs => &mut self.carbs_g,
            NutrientField::Fat => &mut self.fat_g,
            NutrientField::Fiber => &mut self.fiber_g,
            NutrientField::Sodium => &mut self.sodium_mg,
        }
    }
}

impl AddAssign for NutrientProfile {
    fn add_assign(&mut self, other: Self) {
        self.kcal += other.kcal;
        self.protein_g += other.protein_g;
        self.carbs_g += other.carbs_g;
        self.fat_g += other.fat_g;
        self.fiber_g += other.fiber_g;
        self.sodium_mg += other.sodium_mg;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientField {
    Kcal,
    Protein,
    Carbs,
    Fat,
    Fiber,
    Sodium,
}

impl NutrientField {
    const ALL: [NutrientField; 6] = [
        NutrientField::Kcal,
        NutrientField::Protein,
        NutrientField::Carbs,
        NutrientField::Fat,
        NutrientField::Fiber,
        NutrientField::Sodium,
    ];

    fn index(self) -> usize {
        match self {
            NutrientField::Kcal => 0,
            NutrientField::Protein => 1,
            NutrientField::Carbs => 2,
            NutrientField::Fat => 3,
            NutrientField::Fiber => 4,
            NutrientField::Sodium => 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NameMatch {
    Contains(&'static str),
    Exact(&'static str),
}

impl NameMatch {
    fn matches(self, name: &str) -> bool {
        match self {
            NameMatch::Contains(part) => name.contains(part),
            NameMatch::Exact(whole) => name == whole,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NutrientRule {
    pub name: NameMatch,
    pub unit: &'static str,
    pub field: NutrientField,
}

/// Checked in order against the lowercased nutrient name and unit.
/// Energy reported in kJ has no rule and is dropped.
pub const NUTRIENT_RULES: &[NutrientRule] = &[
    NutrientRule {
        name: NameMatch::Contains("energy"),
        unit: "kcal",
        field: NutrientField::Kcal,
    },
    NutrientRule {
        name: NameMatch::Contains("protein"),
        unit: "g",
        field: NutrientField::Protein,
    },
    NutrientRule {
        name: NameMatch::Contains("carbohydrate"),
        unit: "g",
        field: NutrientField::Carbs,
    },
    NutrientRule {
        name: NameMatch::Contains("total lipid"),
        unit: "g",
        field: NutrientField::Fat,
    },
    NutrientRule {
        name: NameMatch::Exact("fat"),
        unit: "g",
        field: NutrientField::Fat,
    },
    NutrientRule {
        name: NameMatch::Contains("fiber"),
        unit: "g",
        field: NutrientField::Fiber,
    },
    NutrientRule {
        name: NameMatch::Contains("sodium"),
        unit: "mg",
        field: NutrientField::Sodium,
    },
];

pub fn classify(name: &str, unit: &str) -> Option<NutrientField> {
    let name = name.to_lowercase();
    let unit = unit.to_lowercase();
    NUTRIENT_RULES
        .iter()
        .find(|rule| rule.unit == unit && rule.name.matches(&name))
        .map(|rule| rule.field)
}

/// Builds a per-100g profile from an FDC nutrient list. The first entry that
/// classifies into a field wins; fields nothing matched stay at zero.
pub fn pick_nutrients(entries: &[FoodNutrientEntry]) -> NutrientProfile {
    let mut profile = NutrientProfile::default();
    let mut filled = [false; NutrientField::ALL.len()];

    for entry in entries {
        let Some(value) = entry.quantity().filter(|v| v.is_finite()) else {
            continue;
        };
        let Some(field) = classify(entry.name(), entry.unit()) else {
            continue;
        };
        if filled[field.index()] {
            continue;
        }
        filled[field.index()] = true;
        *profile.slot(field) = value;
    }

    profile
}

pub async fn fetch_profile(
    database: &dyn NutrientDatabase,
    fdc_id: u64,
) -> Result<NutrientProfile, NutritionError> {
    let food = database.food(fdc_id).await?;
    let profile = pick_nutrients(&food.food_nutrients);
    debug!(fdc_id, ?profile, "Fetched nutrient profile");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_rules() {
        assert_eq!(classify("Energy", "KCAL"), Some(NutrientField::Kcal));
        assert_eq!(classify("Energy", "kJ"), None);
        assert_eq!(classify("Energy (Atwater General Factors)", "kcal"), Some(NutrientField::Kcal));
        assert_eq!(classify("Protein", "g"), Some(NutrientField::Protein));
        assert_eq!(classify("Carbohydrate, by difference", "G"), Some(NutrientField::Carbs));
        assert_eq!(classify("Total lipid (fat)", "g"), Some(NutrientField::Fat));
        assert_eq!(classify("Fat", "g"), Some(NutrientField::Fat));
        assert_eq!(classify("Fatty acids, total saturated", "g"), None);
        assert_eq!(classify("Fiber, total dietary", "g"), Some(NutrientField::Fiber));
        assert_eq!(classify("Sodium, Na", "mg"), Some(NutrientField::Sodium));
        assert_eq!(classify("Sodium, Na", "g"), None);
        assert_eq!(classify("Protein", "mg"), None);
        assert_eq!(classify("Water", "g"), None);
    }

    #[test]
    fn test_pick_nutrients_from_nested_entries() {
        let entries = vec![
            FoodNutrientEntry::nested("Energy", "kcal", 89.0),
            FoodNutrientEntry::nested("Energy", "kJ", 371.0),
            FoodNutrientEntry::nested("Protein", "g", 1.09),
            FoodNutrientEntry::nested("Carbohydrate, by difference", "g", 22.84),
            FoodNutrientEntry::nested("Total lipid (fat)", "g", 0.33),
            FoodNutrientEntry::nested("Fiber, total dietary", "g", 2.6),
            FoodNutrientEntry::nested("Sodium, Na", "mg", 1.0),
        ];
        let profile = pick_nutrients(&entries);
        assert_eq!(
            profile,
            NutrientProfile {
                kcal: 89.0,
                protein_g: 1.09,
                carbs_g: 22.84,
                fat_g: 0.33,
                fiber_g: 2.6,
                sodium_mg: 1.0,
            }
        );
    }

    #[test]
    fn test_pick_nutrients_from_legacy_flat_entries() {
        let entries = vec![
            FoodNutrientEntry::flat("Energy", "KCAL", 387.0),
            FoodNutrientEntry::flat("Carbohydrate, by difference", "G", 99.98),
        ];
        let profile = pick_nutrients(&entries);
        assert_eq!(profile.kcal, 387.0);
        assert_eq!(profile.carbs_g, 99.98);
        assert_eq!(profile.protein_g, 0.0);
    }

    #[test]
    fn test_first_matching_entry_wins() {
        let entries = vec![
            FoodNutrientEntry::nested("Carbohydrate, by difference", "g", 20.0),
            FoodNutrientEntry::nested("Carbohydrate, by summation", "g", 18.0),
            FoodNutrientEntry::nested("Energy (Atwater General Factors)", "kcal", 95.0),
            FoodNutrientEntry::nested("Energy (Atwater Specific Factors)", "kcal", 92.0),
        ];
        let profile = pick_nutrients(&entries);
        assert_eq!(profile.carbs_g, 20.0);
        assert_eq!(profile.kcal, 95.0);
    }

    #[test]
    fn test_entries_without_usable_amount_are_skipped() {
        let mut missing = FoodNutrientEntry::nested("Protein", "g", 0.0);
        missing.amount = None;
        let entries = vec![missing, FoodNutrientEntry::nested("Protein", "g", 3.2)];
        assert_eq!(pick_nutrients(&entries).protein_g, 3.2);
    }

    #[test]
    fn test_missing_nutrients_default_to_zero() {
        assert_eq!(pick_nutrients(&[]), NutrientProfile::default());
    }

    #[test]
    fn test_for_grams_scales_per_100g() {
        let profile = NutrientProfile {
            kcal: 90.0,
            protein_g: 1.1,
            sodium_mg: 10.0,
            ..Default::default()
        };
        let portion = profile.for_grams(200.0);
        assert_eq!(portion.kcal, 180.0);
        assert_eq!(portion.protein_g, 2.2);
        assert_eq!(portion.sodium_mg, 20.0);
    }
}
