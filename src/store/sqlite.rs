use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::time::Duration;
use tracing::info;

use super::{CacheEntry, IngredientMapping, MappingStore, PieceWeightStore, ResultCache};
use crate::error::NutritionError;

/// SQLite-backed implementation of all three stores.
///
/// Cloning is cheap and shares the underlying pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating the file if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, NutritionError> {
        let connection_options =
            if database_url.starts_with("sqlite:") && !database_url.contains('?') {
                format!("{database_url}?mode=rwc")
            } else {
                database_url.to_string()
            };

        let pool = SqlitePool::connect(&connection_options).await?;
        info!(database_url, "Connected to nutrition store");
        Ok(Self { pool })
    }

    /// A private in-memory database. A single connection is kept open for the
    /// lifetime of the pool, since every new SQLite memory connection would
    /// start out empty.
    pub async fn in_memory() -> Result<Self, NutritionError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), NutritionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ingredient_map (
                ingredient_norm TEXT PRIMARY KEY,
                fdc_id INTEGER NOT NULL,
                note TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS piece_weights (
                ingredient_norm TEXT PRIMARY KEY,
                grams_per_piece REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS nutrition_cache (
                recipe_key TEXT PRIMARY KEY,
                data_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn mapping_from_row(row: &SqliteRow) -> Result<IngredientMapping, NutritionError> {
    let fdc_id: i64 = row.try_get("fdc_id")?;
    Ok(IngredientMapping {
        ingredient_norm: row.try_get("ingredient_norm")?,
        fdc_id: u64::try_from(fdc_id).map_err(|_| corrupt(format!("negative fdc_id {fdc_id}")))?,
        note: row.try_get("note")?,
    })
}

fn cache_entry_from_row(row: &SqliteRow) -> Result<CacheEntry, NutritionError> {
    let updated_at_ms: i64 = row.try_get("updated_at")?;
    let updated_at = DateTime::<Utc>::from_timestamp_millis(updated_at_ms)
        .ok_or_else(|| corrupt(format!("updated_at out of range: {updated_at_ms}")))?;
    Ok(CacheEntry {
        recipe_key: row.try_get("recipe_key")?,
        result_json: row.try_get("data_json")?,
        updated_at,
    })
}

fn corrupt(message: String) -> NutritionError {
    NutritionError::StorageError(sqlx::Error::Decode(message.into()))
}

fn unstorable(message: String) -> NutritionError {
    NutritionError::StorageError(sqlx::Error::Encode(message.into()))
}

#[async_trait]
impl MappingStore for SqliteStore {
    async fn get_mapping(
        &self,
        ingredient_norm: &str,
    ) -> Result<Option<IngredientMapping>, NutritionError> {
        let row = sqlx::query(
            "SELECT ingredient_norm, fdc_id, note FROM ingredient_map WHERE ingredient_norm = $1",
        )
        .bind(ingredient_norm)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(mapping_from_row).transpose()
    }

    async fn upsert_mapping(&self, mapping: &IngredientMapping) -> Result<(), NutritionError> {
        let fdc_id = i64::try_from(mapping.fdc_id)
            .map_err(|_| unstorable(format!("fdc_id {} out of range", mapping.fdc_id)))?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO ingredient_map (ingredient_norm, fdc_id, note)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&mapping.ingredient_norm)
        .bind(fdc_id)
        .bind(&mapping.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PieceWeightStore for SqliteStore {
    async fn grams_per_piece(&self, ingredient_norm: &str) -> Result<Option<f64>, NutritionError> {
        let row = sqlx::query(
            "SELECT grams_per_piece FROM piece_weights WHERE ingredient_norm = $1",
        )
        .bind(ingredient_norm)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get::<f64, _>("grams_per_piece")?),
            None => None,
        })
    }

    async fn upsert_piece_weight(
        &self,
        ingredient_norm: &str,
        grams_per_piece: f64,
    ) -> Result<(), NutritionError> {
        sqlx::query(
            "INSERT OR REPLACE INTO piece_weights (ingredient_norm, grams_per_piece) VALUES ($1, $2)",
        )
        .bind(ingredient_norm)
        .bind(grams_per_piece)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ResultCache for SqliteStore {
    async fn get(&self, recipe_key: &str) -> Result<Option<CacheEntry>, NutritionError> {
        let row = sqlx::query(
            "SELECT recipe_key, data_json, updated_at FROM nutrition_cache WHERE recipe_key = $1",
        )
        .bind(recipe_key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(cache_entry_from_row).transpose()
    }

    async fn set(&self, entry: &CacheEntry) -> Result<(), NutritionError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO nutrition_cache (recipe_key, data_json, updated_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&entry.recipe_key)
        .bind(&entry.result_json)
        .bind(entry.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
