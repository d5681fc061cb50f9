pub mod connection;
pub mod endpoints;

use async_trait::async_trait;

use crate::error::NutritionError;
use endpoints::{FoodDetailResponse, FoodSearchHit};

pub use connection::FdcClient;

/// The external food-nutrient database the pipeline queries.
#[async_trait]
pub trait NutrientDatabase: Send + Sync {
    /// Foods matching `query`, best match first.
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchHit>, NutritionError>;

    /// Full record for one food, including its per-100g nutrient list.
    async fn food(&self, fdc_id: u64) -> Result<FoodDetailResponse, NutritionError>;
}
