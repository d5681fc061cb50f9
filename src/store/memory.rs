use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CacheEntry, IngredientMapping, MappingStore, PieceWeightStore, ResultCache};
use crate::error::NutritionError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    mappings: RwLock<HashMap<String, IngredientMapping>>,
    piece_weights: RwLock<HashMap<String, f64>>,
    results: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mapping_count(&self) -> usize {
        self.mappings.read().await.len()
    }

    pub async fn cached_result_count(&self) -> usize {
        self.results.read().await.len()
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn get_mapping(
        &self,
        ingredient_norm: &str,
    ) -> Result<Option<IngredientMapping>, NutritionError> {
        Ok(self.mappings.read().await.get(ingredient_norm).cloned())
    }

    async fn upsert_mapping(&self, mapping: &IngredientMapping) -> Result<(), NutritionError> {
        self.mappings
            .write()
            .await
            .insert(mapping.ingredient_norm.clone(), mapping.clone());
        Ok(())
    }
}

#[async_trait]
impl PieceWeightStore for MemoryStore {
    async fn grams_per_piece(&self, ingredient_norm: &str) -> Result<Option<f64>, NutritionError> {
        Ok(self.piece_weights.read().await.get(ingredient_norm).copied())
    }

    async fn upsert_piece_weight(
        &self,
        ingredient_norm: &str,
        grams_per_piece: f64,
    ) -> Result<(), NutritionError> {
        self.piece_weights
            .write()
            .await
            .insert(ingredient_norm.to_string(), grams_per_piece);
        Ok(())
    }
}

#[async_trait]
impl ResultCache for MemoryStore {
    async fn get(&self, recipe_key: &str) -> Result<Option<CacheEntry>, NutritionError> {
        Ok(self.results.read().await.get(recipe_key).cloned())
    }

    async fn set(&self, entry: &CacheEntry) -> Result<(), NutritionError> {
        self.results
            .write()
            .await
            .insert(entry.recipe_key.clone(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_mapping_upsert_replaces() -> Result<(), NutritionError> {
        let store = MemoryStore::new();
        let mut mapping = IngredientMapping {
            ingredient_norm: "olive oil".to_string(),
            fdc_id: 171413,
            note: None,
        };
        store.upsert_mapping(&mapping).await?;
        mapping.fdc_id = 748608;
        store.upsert_mapping(&mapping).await?;

        assert_eq!(store.get_mapping("olive oil").await?.map(|m| m.fdc_id), Some(748608));
        assert_eq!(store.mapping_count().await, 1);
        assert!(store.get_mapping("butter").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_result_cache_last_writer_wins() -> Result<(), NutritionError> {
        let store = MemoryStore::new();
        let first = CacheEntry {
            recipe_key: "soup".to_string(),
            result_json: "{\"a\":1}".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let second = CacheEntry {
            result_json: "{\"b\":2}".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            ..first.clone()
        };
        ResultCache::set(&store, &first).await?;
        ResultCache::set(&store, &second).await?;

        assert_eq!(ResultCache::get(&store, "soup").await?, Some(second));
        assert_eq!(store.cached_result_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_piece_weights() -> Result<(), NutritionError> {
        let store = MemoryStore::new();
        assert_eq!(store.grams_per_piece("egg").await?, None);
        store.upsert_piece_weight("egg", 50.0).await?;
        assert_eq!(store.grams_per_piece("egg").await?, Some(50.0));
        Ok(())
    }
}
