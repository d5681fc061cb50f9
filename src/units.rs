use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_LIQUID_DENSITY_G_PER_ML;

pub const MG_PER_G: f64 = 1000.0;
pub const GRAMS_PER_KG: f64 = 1000.0;
pub const ML_PER_L: f64 = 1000.0;
pub const GRAMS_PER_TSP: f64 = 5.0;
pub const GRAMS_PER_TBSP: f64 = 15.0;
pub const GRAMS_PER_PINCH: f64 = 0.3;

/// Unit codes as they are stored on recipe ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Mg,
    G,
    Kg,
    Ml,
    L,
    Tsp,
    Tbsp,
    Pinch,
    Pcs,
    // Display-only: recipes may use these but they carry no gram factor.
    Oz,
    Lb,
    Pack,
    Bar,
}

impl Unit {
    /// Exact, case-sensitive match on the trimmed code.
    pub fn from_code(code: &str) -> Option<Self> {
        let unit = match code.trim() {
            "mg" => Unit::Mg,
            "g" => Unit::G,
            "kg" => Unit::Kg,
            "ml" => Unit::Ml,
            "l" => Unit::L,
            "tsp" => Unit::Tsp,
            "tbsp" => Unit::Tbsp,
            "pinch" => Unit::Pinch,
            "pcs" => Unit::Pcs,
            "oz" => Unit::Oz,
            "lb" => Unit::Lb,
            "pack" => Unit::Pack,
            "bar" => Unit::Bar,
            _ => return None,
        };
        Some(unit)
    }

    pub fn code(self) -> &'static str {
        match self {
            Unit::Mg => "mg",
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Ml => "ml",
            Unit::L => "l",
            Unit::Tsp => "tsp",
            Unit::Tbsp => "tbsp",
            Unit::Pinch => "pinch",
            Unit::Pcs => "pcs",
            Unit::Oz => "oz",
            Unit::Lb => "lb",
            Unit::Pack => "pack",
            Unit::Bar => "bar",
        }
    }

    /// Label shown next to an amount in the recipe UI (Czech locale).
    pub fn label(self) -> &'static str {
        match self {
            Unit::Pcs => "ks",
            Unit::Pinch => "špetka",
            Unit::Tsp => "lžička",
            Unit::Tbsp => "lžíce",
            Unit::Pack => "balení",
            Unit::Bar => "kostka",
            other => other.code(),
        }
    }

    /// Grams per one unit, or `None` when the unit needs an ingredient-specific
    /// weight (`pcs`) or is display-only.
    pub fn grams_factor(self, liquid_density_g_per_ml: f64) -> Option<f64> {
        match self {
            Unit::Mg => Some(1.0 / MG_PER_G),
            Unit::G => Some(1.0),
            Unit::Kg => Some(GRAMS_PER_KG),
            Unit::Ml => Some(liquid_density_g_per_ml),
            Unit::L => Some(ML_PER_L * liquid_density_g_per_ml),
            Unit::Tsp => Some(GRAMS_PER_TSP),
            Unit::Tbsp => Some(GRAMS_PER_TBSP),
            Unit::Pinch => Some(GRAMS_PER_PINCH),
            Unit::Pcs | Unit::Oz | Unit::Lb | Unit::Pack | Unit::Bar => None,
        }
    }
}

/// Display label for a raw unit string; unknown codes are echoed back trimmed.
pub fn unit_label(raw: &str) -> String {
    match Unit::from_code(raw) {
        Some(unit) => unit.label().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Converts an ingredient quantity to grams, treating liquids as water.
pub fn to_grams(amount: f64, unit: &str, grams_per_piece: Option<f64>) -> Option<f64> {
    to_grams_with_density(amount, unit, grams_per_piece, DEFAULT_LIQUID_DENSITY_G_PER_ML)
}

pub fn to_grams_with_density(
    amount: f64,
    unit: &str,
    grams_per_piece: Option<f64>,
    liquid_density_g_per_ml: f64,
) -> Option<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    match Unit::from_code(unit)? {
        Unit::Mg => Some(amount / MG_PER_G),
        Unit::Pcs => grams_per_piece
            .filter(|per_piece| per_piece.is_finite() && *per_piece > 0.0)
            .map(|per_piece| amount * per_piece),
        other => other
            .grams_factor(liquid_density_g_per_ml)
            .map(|factor| amount * factor),
    }
}
