use std::fmt::Write;

use crate::recipe::Ingredient;
use crate::recipe_aggregator::{NutrientTotals, UnknownIngredient};
use crate::units::unit_label;

pub const NOT_AVAILABLE: &str = "Nutrition data is not available.";
pub const UNKNOWN_FOOTNOTE: &str = "Some ingredients could not be calculated.";

fn fmt_value(value: f64, digits: usize) -> String {
    if value.is_finite() {
        format!("{value:.digits$}")
    } else {
        "–".to_string()
    }
}

fn describe(ingredient: &Ingredient) -> String {
    match (ingredient.amount, ingredient.unit.as_deref()) {
        (Some(amount), Some(unit)) => {
            format!("{} ({} {})", ingredient.name, amount, unit_label(unit))
        }
        (Some(amount), None) => format!("{} ({})", ingredient.name, amount),
        _ => ingredient.name.clone(),
    }
}

/// Plain-text nutrition table for one serving.
pub fn render_table(per_serving: Option<&NutrientTotals>, unknown: &[UnknownIngredient]) -> String {
    let Some(totals) = per_serving else {
        return NOT_AVAILABLE.to_string();
    };

    let rows = [
        ("Energy", fmt_value(totals.kcal, 0), "kcal"),
        ("Protein", fmt_value(totals.protein_g, 1), "g"),
        ("Carbs", fmt_value(totals.carbs_g, 1), "g"),
        ("Fat", fmt_value(totals.fat_g, 1), "g"),
        ("Fiber", fmt_value(totals.fiber_g, 1), "g"),
        ("Salt", fmt_value(totals.salt_g, 1), "g"),
    ];

    let mut out = String::from("Estimated nutrition (1 serving)\n");
    for (label, value, unit) in rows {
        let _ = writeln!(out, "{label:<10}{value:>8} {unit}");
    }
    if !unknown.is_empty() {
        let _ = writeln!(out, "\n{UNKNOWN_FOOTNOTE}");
        for entry in unknown {
            let _ = writeln!(out, "  - {}: {}", describe(&entry.ingredient), entry.reason);
        }
    }
    out
}
