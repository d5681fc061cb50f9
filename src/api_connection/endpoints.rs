use serde::{Deserialize, Serialize};

pub const FDC_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const SEARCH_PAGE_SIZE: u32 = 5;

pub const SEARCH_ENDPOINT: &str = "FDC search";
pub const FOOD_ENDPOINT: &str = "FDC food";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FoodSearchResponse {
    #[serde(default)]
    pub foods: Vec<FoodSearchHit>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchHit {
    #[serde(default)]
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetailResponse {
    #[serde(default)]
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrientEntry>,
}

/// One entry of `foodNutrients`. Current FDC responses nest the name and unit
/// under `nutrient` and report `amount`; older (abridged) ones are flat with
/// `nutrientName` / `unitName` / `value`.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrientEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient: Option<NutrientInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutrientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_name: String,
}

impl FoodNutrientEntry {
    pub fn nested(name: &str, unit: &str, amount: f64) -> Self {
        Self {
            nutrient: Some(NutrientInfo {
                name: name.to_string(),
                unit_name: unit.to_string(),
            }),
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn flat(name: &str, unit: &str, value: f64) -> Self {
        Self {
            nutrient_name: Some(name.to_string()),
            unit_name: Some(unit.to_string()),
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.nutrient
            .as_ref()
            .map(|n| n.name.as_str())
            .filter(|name| !name.is_empty())
            .or(self.nutrient_name.as_deref())
            .unwrap_or_default()
    }

    pub fn unit(&self) -> &str {
        self.nutrient
            .as_ref()
            .map(|n| n.unit_name.as_str())
            .filter(|unit| !unit.is_empty())
            .or(self.unit_name.as_deref())
            .unwrap_or_default()
    }

    pub fn quantity(&self) -> Option<f64> {
        self.amount.or(self.value)
    }
}
