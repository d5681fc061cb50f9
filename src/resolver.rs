use tracing::{debug, info};

use crate::api_connection::NutrientDatabase;
use crate::error::NutritionError;
use crate::store::{IngredientMapping, MappingStore};

/// Cache key for an ingredient: lowercase, trimmed, inner whitespace runs
/// collapsed to a single space.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(u64),
    /// The database has no food for this name. Not an error.
    Unresolved,
}

/// Resolves normalized ingredient names to FDC ids, searching FDC at most once
/// per distinct name and remembering every hit in the mapping store.
pub struct IngredientResolver<'a> {
    mappings: &'a dyn MappingStore,
    database: &'a dyn NutrientDatabase,
}

impl<'a> IngredientResolver<'a> {
    pub fn new(mappings: &'a dyn MappingStore, database: &'a dyn NutrientDatabase) -> Self {
        Self { mappings, database }
    }

    pub async fn resolve(&self, ingredient_norm: &str) -> Result<Resolution, NutritionError> {
        match self.mappings.get_mapping(ingredient_norm).await? {
            Some(mapping) if mapping.fdc_id != 0 => {
                debug!(ingredient = ingredient_norm, fdc_id = mapping.fdc_id, "Mapping cache hit");
                return Ok(Resolution::Resolved(mapping.fdc_id));
            }
            Some(_) => debug!(ingredient = ingredient_norm, "Ignoring mapping with FDC id 0"),
            None => {}
        }

        let hits = self.database.search(ingredient_norm).await?;
        let Some((fdc_id, description)) = hits
            .first()
            .and_then(|hit| {
                hit.fdc_id
                    .filter(|id| *id != 0)
                    .map(|id| (id, hit.description.clone()))
            })
        else {
            debug!(ingredient = ingredient_norm, "No FDC match");
            return Ok(Resolution::Unresolved);
        };

        let mapping = IngredientMapping {
            ingredient_norm: ingredient_norm.to_string(),
            fdc_id,
            note: Some(format!("auto-match: {}", description.unwrap_or_default())),
        };
        self.mappings.upsert_mapping(&mapping).await?;
        info!(ingredient = ingredient_norm, fdc_id, "Mapped ingredient to FDC food");

        Ok(Resolution::Resolved(fdc_id))
    }
}
