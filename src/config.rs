use dotenv::dotenv;
use std::env;
use tracing::warn;

use crate::api_connection::endpoints::FDC_BASE_URL;

pub const API_KEY_ENV_VAR: &str = "FDC_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "FDC_BASE_URL";
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
pub const CACHE_TTL_ENV_VAR: &str = "NUTRITION_CACHE_TTL_DAYS";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./meals.db";
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 7;

/// Grams of salt per gram of sodium.
pub const DEFAULT_SALT_PER_SODIUM: f64 = 2.5;
/// Liquids are weighed as water unless told otherwise.
pub const DEFAULT_LIQUID_DENSITY_G_PER_ML: f64 = 1.0;

/// Domain approximations used by the pipeline. Both are rough and kept
/// adjustable so they can be corrected without touching the algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionConstants {
    pub salt_per_sodium: f64,
    pub liquid_density_g_per_ml: f64,
}

impl Default for NutritionConstants {
    fn default() -> Self {
        Self {
            salt_per_sodium: DEFAULT_SALT_PER_SODIUM,
            liquid_density_g_per_ml: DEFAULT_LIQUID_DENSITY_G_PER_ML,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// May be empty; the pipeline rejects an empty key only when it has to call FDC.
    pub api_key: String,
    pub base_url: String,
    pub database_url: String,
    pub cache_ttl_days: i64,
    pub constants: NutritionConstants,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: FDC_BASE_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            constants: NutritionConstants::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let cache_ttl_days = match env::var(CACHE_TTL_ENV_VAR) {
            Ok(raw) => parse_ttl_days(&raw).unwrap_or_else(|| {
                warn!(
                    value = %raw,
                    "Ignoring invalid {}, using {} days", CACHE_TTL_ENV_VAR, DEFAULT_CACHE_TTL_DAYS
                );
                DEFAULT_CACHE_TTL_DAYS
            }),
            Err(_) => defaults.cache_ttl_days,
        };

        Self {
            api_key: env::var(API_KEY_ENV_VAR).unwrap_or_default().trim().to_string(),
            base_url: env::var(BASE_URL_ENV_VAR).unwrap_or(defaults.base_url),
            database_url: env::var(DATABASE_URL_ENV_VAR).unwrap_or(defaults.database_url),
            cache_ttl_days,
            constants: defaults.constants,
        }
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days)
    }
}

fn parse_ttl_days(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|days| *days > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://api.nal.usda.gov/fdc/v1");
        assert_eq!(config.cache_ttl_days, 7);
        assert_eq!(config.cache_ttl(), chrono::Duration::days(7));
        assert_eq!(config.constants.salt_per_sodium, 2.5);
        assert_eq!(config.constants.liquid_density_g_per_ml, 1.0);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_parse_ttl_days() {
        assert_eq!(parse_ttl_days(" 3 "), Some(3));
        assert_eq!(parse_ttl_days("0"), None);
        assert_eq!(parse_ttl_days("-2"), None);
        assert_eq!(parse_ttl_days("week"), None);
    }
}
