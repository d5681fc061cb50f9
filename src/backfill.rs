use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{NutritionService, NutritionStore};
use crate::error::NutritionError;
use crate::recipe::Recipe;

pub const DEFAULT_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub processed: usize,
    pub skipped_fresh: usize,
    pub failed: usize,
}

/// Computes and caches nutrition for every recipe whose cache entry is
/// missing or stale, one recipe at a time, pausing `delay` after each
/// computation to stay under the FDC rate limit.
///
/// A failing recipe is logged and counted; the run carries on. Only an error
/// reading the cache itself aborts the run.
pub async fn backfill(
    service: &NutritionService<impl NutritionStore>,
    recipes: &[Recipe],
    delay: Duration,
) -> Result<BackfillSummary, NutritionError> {
    let mut summary = BackfillSummary::default();
    info!(recipes = recipes.len(), "Starting nutrition backfill");

    for recipe in recipes {
        if service.cached(&recipe.slug).await?.is_some() {
            summary.skipped_fresh += 1;
            continue;
        }

        match service
            .refresh(&recipe.slug, &recipe.ingredients, recipe.servings)
            .await
        {
            Ok(result) => {
                summary.processed += 1;
                info!(slug = %recipe.slug, unknown = result.unknown.len(), "Backfilled");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(slug = %recipe.slug, error = %e, "Backfill failed");
            }
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(?summary, "Backfill done");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::NutrientDatabase;
    use crate::recipe::{Ingredient, IngredientGroup};
    use crate::store::MemoryStore;
    use crate::test_support::{nutrients, FakeNutrientDatabase};
    use std::sync::Arc;

    fn recipe(slug: &str, ingredient: &str) -> Recipe {
        Recipe {
            slug: slug.to_string(),
            title: String::new(),
            servings: Some(2.0),
            ingredients: vec![IngredientGroup {
                title: String::new(),
                items: vec![Ingredient::new(ingredient, Some(100.0), Some("g"))],
            }],
        }
    }

    #[tokio::test]
    async fn test_backfill_skips_fresh_and_counts() -> Result<(), NutritionError> {
        let database: Arc<dyn NutrientDatabase> = Arc::new(
            FakeNutrientDatabase::new().with_food(
                "rice",
                169756,
                "Rice, white",
                nutrients(130.0, 2.7, 28.0, 0.3, 0.4, 1.0),
            ),
        );
        let store = Arc::new(MemoryStore::new());
        let service = NutritionService::new(store.clone(), Some(database));
        let recipes = vec![recipe("rice-bowl", "rice"), recipe("rice-salad", "rice")];

        let first = backfill(&service, &recipes, Duration::ZERO).await?;
        assert_eq!(
            first,
            BackfillSummary {
                processed: 2,
                skipped_fresh: 0,
                failed: 0
            }
        );

        let second = backfill(&service, &recipes, Duration::ZERO).await?;
        assert_eq!(second.skipped_fresh, 2);
        assert_eq!(second.processed, 0);
        assert_eq!(store.cached_result_count().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_backfill_continues_after_failure() -> Result<(), NutritionError> {
        let database: Arc<dyn NutrientDatabase> =
            Arc::new(FakeNutrientDatabase::new().failing_search());
        let store = Arc::new(MemoryStore::new());
        let service = NutritionService::new(store.clone(), Some(database));
        let recipes = vec![recipe("a", "rice"), recipe("b", "beans")];

        let summary = backfill(&service, &recipes, Duration::from_millis(1)).await?;
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.processed, 0);
        assert_eq!(store.cached_result_count().await, 0);
        Ok(())
    }
}
