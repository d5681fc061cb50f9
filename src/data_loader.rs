use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::recipe::Recipe;
use crate::resolver::normalize_name;
use crate::store::PieceWeightStore;

const NAME_COL: &str = "name";
const GRAMS_COL: &str = "grams_per_piece";

#[derive(Debug, Clone, PartialEq)]
pub struct PieceWeightRow {
    pub ingredient_norm: String,
    pub grams_per_piece: f64,
}

/// Reads a `name,grams_per_piece` CSV. Names are normalized; rows with an
/// empty name or a weight that is not a positive number are skipped.
pub fn load_piece_weights(csv_path: &Path) -> Result<Vec<PieceWeightRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open piece weight CSV at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in {:?}", name, csv_path))
    };
    let name_idx = column(NAME_COL)?;
    let grams_idx = column(GRAMS_COL)?;

    let mut rows = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let ingredient_norm = normalize_name(record.get(name_idx).unwrap_or_default());
        if ingredient_norm.is_empty() {
            continue;
        }

        let raw = record.get(grams_idx).unwrap_or_default();
        match raw.parse::<f64>() {
            Ok(grams) if grams.is_finite() && grams > 0.0 => rows.push(PieceWeightRow {
                ingredient_norm,
                grams_per_piece: grams,
            }),
            _ => warn!(
                row = row_index + 1,
                ingredient = %ingredient_norm,
                value = raw,
                "Skipping invalid piece weight"
            ),
        }
    }

    Ok(rows)
}

/// Upserts every row; later rows for the same name win.
pub async fn seed_piece_weights(
    store: &dyn PieceWeightStore,
    rows: &[PieceWeightRow],
) -> Result<usize> {
    for row in rows {
        store
            .upsert_piece_weight(&row.ingredient_norm, row.grams_per_piece)
            .await
            .with_context(|| {
                format!("Failed to store piece weight for '{}'", row.ingredient_norm)
            })?;
    }
    info!(count = rows.len(), "Seeded piece weights");
    Ok(rows.len())
}

/// Reads recipes from a JSON file holding either one recipe object or an
/// array of them.
pub async fn load_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recipe file {:?}", path))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Recipe file {:?} is not valid JSON", path))?;

    let recipes = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item)
                    .with_context(|| format!("Invalid recipe at index {} in {:?}", idx, path))
            })
            .collect::<Result<Vec<Recipe>>>()?,
        other => vec![serde_json::from_value(other)
            .with_context(|| format!("Invalid recipe in {:?}", path))?],
    };
    Ok(recipes)
}
