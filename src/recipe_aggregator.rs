use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api_connection::{FdcClient, NutrientDatabase};
use crate::config::NutritionConstants;
use crate::error::NutritionError;
use crate::nutritional_matcher::{fetch_profile, NutrientProfile};
use crate::recipe::{flatten_groups, Ingredient, IngredientGroup};
use crate::resolver::{normalize_name, IngredientResolver, Resolution};
use crate::store::{MappingStore, PieceWeightStore};
use crate::units::{to_grams_with_density, Unit};

pub const REASON_UNIT: &str =
    "cannot convert unit to grams (count or spoon unit without a known weight)";
pub const REASON_NOT_FOUND: &str = "not found in the USDA database";

/// Absolute nutrient amounts for a whole recipe or one serving.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutrientTotals {
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub salt_g: f64,
}

impl NutrientTotals {
    pub fn from_profile(sum: &NutrientProfile, salt_per_sodium: f64) -> Self {
        Self {
            kcal: sum.kcal,
            protein_g: sum.protein_g,
            carbs_g: sum.carbs_g,
            fat_g: sum.fat_g,
            fiber_g: sum.fiber_g,
            salt_g: sum.sodium_mg / 1000.0 * salt_per_sodium,
        }
    }

    pub fn divided_by(&self, divisor: f64) -> Self {
        Self {
            kcal: self.kcal / divisor,
            protein_g: self.protein_g / divisor,
            carbs_g: self.carbs_g / divisor,
            fat_g: self.fat_g / divisor,
            fiber_g: self.fiber_g / divisor,
            salt_g: self.salt_g / divisor,
        }
    }
}

/// An ingredient left out of the totals, serialized as the ingredient's own
/// fields plus `reason`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UnknownIngredient {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionResult {
    pub per_recipe: NutrientTotals,
    pub per_serving: NutrientTotals,
    pub unknown: Vec<UnknownIngredient>,
}

/// `servings` if it is a usable divisor, else 1.
pub fn safe_servings(servings: Option<f64>) -> f64 {
    match servings {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => 1.0,
    }
}

pub struct NutritionAggregator<'a> {
    database: &'a dyn NutrientDatabase,
    mappings: &'a dyn MappingStore,
    piece_weights: &'a dyn PieceWeightStore,
    constants: NutritionConstants,
}

impl<'a> NutritionAggregator<'a> {
    pub fn new(
        database: &'a dyn NutrientDatabase,
        mappings: &'a dyn MappingStore,
        piece_weights: &'a dyn PieceWeightStore,
    ) -> Self {
        Self {
            database,
            mappings,
            piece_weights,
            constants: NutritionConstants::default(),
        }
    }

    pub fn with_constants(mut self, constants: NutritionConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Sums the nutrients of every ingredient whose mass and FDC food are
    /// both known. Ingredients are handled one at a time, in list order; any
    /// store or FDC error aborts the whole computation.
    pub async fn compute_nutrition(
        &self,
        groups: &[IngredientGroup],
        servings: Option<f64>,
    ) -> Result<NutritionResult, NutritionError> {
        let resolver = IngredientResolver::new(self.mappings, self.database);
        let mut sum = NutrientProfile::default();
        let mut unknown = Vec::new();

        for ingredient in flatten_groups(groups) {
            let ingredient_norm = normalize_name(&ingredient.name);
            if ingredient_norm.is_empty() {
                continue;
            }
            debug!(
                ingredient = %ingredient_norm,
                amount = ?ingredient.amount,
                unit = ?ingredient.unit,
                "Processing ingredient"
            );

            let Some(grams) = self.grams_of(ingredient, &ingredient_norm).await? else {
                warn!(
                    ingredient = %ingredient_norm,
                    unit = ?ingredient.unit,
                    "No mass for ingredient"
                );
                unknown.push(UnknownIngredient {
                    ingredient: ingredient.clone(),
                    reason: REASON_UNIT.to_string(),
                });
                continue;
            };

            let fdc_id = match resolver.resolve(&ingredient_norm).await? {
                Resolution::Resolved(fdc_id) => fdc_id,
                Resolution::Unresolved => {
                    warn!(ingredient = %ingredient_norm, "Ingredient not found in FDC");
                    unknown.push(UnknownIngredient {
                        ingredient: ingredient.clone(),
                        reason: REASON_NOT_FOUND.to_string(),
                    });
                    continue;
                }
            };

            let profile = fetch_profile(self.database, fdc_id).await?;
            sum += profile.for_grams(grams);
        }

        let per_recipe = NutrientTotals::from_profile(&sum, self.constants.salt_per_sodium);
        let per_serving = per_recipe.divided_by(safe_servings(servings));

        Ok(NutritionResult {
            per_recipe,
            per_serving,
            unknown,
        })
    }

    async fn grams_of(
        &self,
        ingredient: &Ingredient,
        ingredient_norm: &str,
    ) -> Result<Option<f64>, NutritionError> {
        let (Some(amount), Some(unit)) = (ingredient.amount, ingredient.unit.as_deref()) else {
            return Ok(None);
        };

        let grams_per_piece = if Unit::from_code(unit) == Some(Unit::Pcs) {
            self.piece_weights.grams_per_piece(ingredient_norm).await?
        } else {
            None
        };

        // Zero, negative or NaN grams count as no mass.
        Ok(to_grams_with_density(
            amount,
            unit,
            grams_per_piece,
            self.constants.liquid_density_g_per_ml,
        )
        .filter(|grams| grams.is_finite() && *grams > 0.0))
    }
}

/// Computes nutrition against the public FDC API. Fails with
/// [`NutritionError::MissingApiKey`] before doing any work if `api_key` is
/// blank.
pub async fn compute_nutrition_from_ingredients<S>(
    groups: &[IngredientGroup],
    servings: Option<f64>,
    api_key: &str,
    store: &S,
) -> Result<NutritionResult, NutritionError>
where
    S: MappingStore + PieceWeightStore,
{
    let client = FdcClient::new(api_key)?;
    NutritionAggregator::new(&client, store, store)
        .compute_nutrition(groups, servings)
        .await
}
