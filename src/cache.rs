//! Per-recipe nutrition cache with a freshness window.
//!
//! [`NutritionService`] is the read-through entry point: a fresh cached
//! result is returned as stored; anything else is recomputed and written
//! back. Concurrent misses for the same key are not coalesced, so both
//! compute and the later write wins.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::api_connection::{FdcClient, NutrientDatabase};
use crate::config::{Config, NutritionConstants, API_KEY_ENV_VAR};
use crate::error::NutritionError;
use crate::recipe::IngredientGroup;
use crate::recipe_aggregator::{NutritionAggregator, NutritionResult};
use crate::store::{CacheEntry, MappingStore, PieceWeightStore, ResultCache};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the service needs from a backend.
pub trait NutritionStore: MappingStore + PieceWeightStore + ResultCache {}

impl<T: MappingStore + PieceWeightStore + ResultCache> NutritionStore for T {}

/// An entry written at `updated_at` is fresh while strictly less than `ttl`
/// has passed.
pub fn is_fresh(updated_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now - updated_at < ttl
}

pub struct NutritionService<S> {
    store: Arc<S>,
    /// `None` when no API key is configured. Only a cache miss needs it.
    database: Option<Arc<dyn NutrientDatabase>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    constants: NutritionConstants,
}

impl<S: NutritionStore> NutritionService<S> {
    pub fn new(store: Arc<S>, database: Option<Arc<dyn NutrientDatabase>>) -> Self {
        let defaults = Config::default();
        Self {
            store,
            database,
            clock: Arc::new(SystemClock),
            ttl: defaults.cache_ttl(),
            constants: defaults.constants,
        }
    }

    /// Builds the FDC client from `config`. A blank key is not an error here;
    /// it surfaces on the first cache miss instead.
    pub fn from_config(config: &Config, store: Arc<S>) -> Result<Self, NutritionError> {
        let database: Option<Arc<dyn NutrientDatabase>> =
            match FdcClient::with_base_url(&config.api_key, &config.base_url) {
                Ok(client) => Some(Arc::new(client)),
                Err(NutritionError::MissingApiKey(_)) => None,
                Err(e) => return Err(e),
            };

        Ok(Self::new(store, database)
            .with_ttl(config.cache_ttl())
            .with_constants(config.constants))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_constants(mut self, constants: NutritionConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The cached result for `recipe_key` if it is still fresh.
    pub async fn cached(
        &self,
        recipe_key: &str,
    ) -> Result<Option<NutritionResult>, NutritionError> {
        let Some(entry) = self.store.get(recipe_key).await? else {
            return Ok(None);
        };

        if !is_fresh(entry.updated_at, self.clock.now(), self.ttl) {
            info!(recipe_key, updated_at = %entry.updated_at, "Cached nutrition is stale");
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&entry.result_json)?))
    }

    pub async fn nutrition_for(
        &self,
        recipe_key: &str,
        groups: &[IngredientGroup],
        servings: Option<f64>,
    ) -> Result<NutritionResult, NutritionError> {
        if let Some(result) = self.cached(recipe_key).await? {
            info!(recipe_key, "Nutrition cache hit");
            return Ok(result);
        }

        info!(recipe_key, "Nutrition cache miss");
        self.refresh(recipe_key, groups, servings).await
    }

    /// Computes without reading or writing the result cache. Ingredient
    /// mappings are still learned.
    pub async fn compute(
        &self,
        groups: &[IngredientGroup],
        servings: Option<f64>,
    ) -> Result<NutritionResult, NutritionError> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| NutritionError::MissingApiKey(API_KEY_ENV_VAR.to_string()))?;

        NutritionAggregator::new(database, self.store.as_ref(), self.store.as_ref())
            .with_constants(self.constants)
            .compute_nutrition(groups, servings)
            .await
    }

    /// Recomputes unconditionally and overwrites the cache entry.
    pub async fn refresh(
        &self,
        recipe_key: &str,
        groups: &[IngredientGroup],
        servings: Option<f64>,
    ) -> Result<NutritionResult, NutritionError> {
        let result = self.compute(groups, servings).await?;

        let entry = CacheEntry {
            recipe_key: recipe_key.to_string(),
            result_json: serde_json::to_string(&result)?,
            updated_at: self.clock.now(),
        };
        self.store.set(&entry).await?;
        info!(recipe_key, unknown = result.unknown.len(), "Cached nutrition");

        Ok(result)
    }
}
