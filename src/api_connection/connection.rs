use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::endpoints::{
    FoodDetailResponse, FoodSearchHit, FoodSearchResponse, FDC_BASE_URL, FOOD_ENDPOINT,
    SEARCH_ENDPOINT, SEARCH_PAGE_SIZE,
};
use super::NutrientDatabase;
use crate::config::API_KEY_ENV_VAR;
use crate::error::NutritionError;

const USER_AGENT: &str = concat!("foodies-nutrition/", env!("CARGO_PKG_VERSION"));

/// Client for the USDA FoodData Central REST API.
#[derive(Debug, Clone)]
pub struct FdcClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FdcClient {
    /// Fails with [`NutritionError::MissingApiKey`] on an empty key so callers
    /// learn about the misconfiguration before any request is sent.
    pub fn new(api_key: &str) -> Result<Self, NutritionError> {
        Self::with_base_url(api_key, FDC_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, NutritionError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(NutritionError::MissingApiKey(API_KEY_ENV_VAR.to_string()));
        }

        let http = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn search_foods(&self, query: &str) -> Result<FoodSearchResponse, NutritionError> {
        let url = format!("{}/foods/search", self.base_url);
        debug!(query, "FDC search");

        let page_size = SEARCH_PAGE_SIZE.to_string();
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        decode_response(SEARCH_ENDPOINT, response).await
    }

    pub async fn food_details(&self, fdc_id: u64) -> Result<FoodDetailResponse, NutritionError> {
        let url = format!("{}/food/{}", self.base_url, fdc_id);
        debug!(fdc_id, "FDC food lookup");

        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        decode_response(FOOD_ENDPOINT, response).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, NutritionError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        return Err(NutritionError::ApiError {
            endpoint,
            status,
            error_body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| NutritionError::DecodeError { endpoint, source })
}

#[async_trait]
impl NutrientDatabase for FdcClient {
    async fn search(&self, query: &str) -> Result<Vec<FoodSearchHit>, NutritionError> {
        Ok(self.search_foods(query).await?.foods)
    }

    async fn food(&self, fdc_id: u64) -> Result<FoodDetailResponse, NutritionError> {
        self.food_details(fdc_id).await
    }
}
