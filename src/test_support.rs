//! In-process stand-in for FDC used by unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api_connection::endpoints::{
    FoodDetailResponse, FoodNutrientEntry, FoodSearchHit, FOOD_ENDPOINT, SEARCH_ENDPOINT,
};
use crate::api_connection::NutrientDatabase;
use crate::error::NutritionError;

#[derive(Default)]
pub struct FakeNutrientDatabase {
    hits: HashMap<String, FoodSearchHit>,
    foods: HashMap<u64, FoodDetailResponse>,
    fail_search: bool,
    fail_food: bool,
    search_calls: AtomicUsize,
    food_calls: AtomicUsize,
}

impl FakeNutrientDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a search hit for the exact `query` and the food it points to.
    pub fn with_food(
        mut self,
        query: &str,
        fdc_id: u64,
        description: &str,
        nutrients: Vec<FoodNutrientEntry>,
    ) -> Self {
        self.hits.insert(
            query.to_string(),
            FoodSearchHit {
                fdc_id: Some(fdc_id),
                description: Some(description.to_string()),
            },
        );
        self.foods.insert(
            fdc_id,
            FoodDetailResponse {
                fdc_id: Some(fdc_id),
                description: Some(description.to_string()),
                food_nutrients: nutrients,
            },
        );
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_food(mut self) -> Self {
        self.fail_food = true;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn food_calls(&self) -> usize {
        self.food_calls.load(Ordering::SeqCst)
    }
}

/// A minimal nested-shape nutrient list.
pub fn nutrients(
    kcal: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    fiber_g: f64,
    sodium_mg: f64,
) -> Vec<FoodNutrientEntry> {
    vec![
        FoodNutrientEntry::nested("Energy", "kcal", kcal),
        FoodNutrientEntry::nested("Protein", "g", protein_g),
        FoodNutrientEntry::nested("Carbohydrate, by difference", "g", carbs_g),
        FoodNutrientEntry::nested("Total lipid (fat)", "g", fat_g),
        FoodNutrientEntry::nested("Fiber, total dietary", "g", fiber_g),
        FoodNutrientEntry::nested("Sodium, Na", "mg", sodium_mg),
    ]
}

#[async_trait]
impl NutrientDatabase for FakeNutrientDatabase {
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchHit>, NutritionError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(NutritionError::ApiError {
                endpoint: SEARCH_ENDPOINT,
                status: reqwest::StatusCode::TOO_MANY_REQUESTS,
                error_body: "rate limited".to_string(),
            });
        }
        Ok(self.hits.get(query).cloned().into_iter().collect())
    }

    async fn food(&self, fdc_id: u64) -> Result<FoodDetailResponse, NutritionError> {
        self.food_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_food {
            return Err(NutritionError::ApiError {
                endpoint: FOOD_ENDPOINT,
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                error_body: String::new(),
            });
        }
        self.foods.get(&fdc_id).cloned().ok_or(NutritionError::ApiError {
            endpoint: FOOD_ENDPOINT,
            status: reqwest::StatusCode::NOT_FOUND,
            error_body: format!("no food {fdc_id}"),
        })
    }
}
