//! Persistent key-value stores used by the nutrition pipeline.
//!
//! The pipeline only sees the traits below; the caller decides which backend
//! backs them and owns its lifecycle. [`SqliteStore`] is the production
//! backend, [`MemoryStore`] serves tests and one-off runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NutritionError;

/// Normalized ingredient name → FDC identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientMapping {
    pub ingredient_norm: String,
    pub fdc_id: u64,
    pub note: Option<String>,
}

/// A computed nutrition result as stored, JSON-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub recipe_key: String,
    pub result_json: String,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn get_mapping(&self, ingredient_norm: &str)
        -> Result<Option<IngredientMapping>, NutritionError>;

    /// Inserts or fully replaces the mapping for `mapping.ingredient_norm`.
    async fn upsert_mapping(&self, mapping: &IngredientMapping) -> Result<(), NutritionError>;
}

#[async_trait]
pub trait PieceWeightStore: Send + Sync {
    async fn grams_per_piece(&self, ingredient_norm: &str) -> Result<Option<f64>, NutritionError>;

    async fn upsert_piece_weight(
        &self,
        ingredient_norm: &str,
        grams_per_piece: f64,
    ) -> Result<(), NutritionError>;
}

/// Per-recipe result cache. Holds no expiry policy of its own: callers read
/// `updated_at` and decide whether an entry is still fresh.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, recipe_key: &str) -> Result<Option<CacheEntry>, NutritionError>;

    /// Last writer wins; an existing entry is replaced, never merged.
    async fn set(&self, entry: &CacheEntry) -> Result<(), NutritionError>;
}
