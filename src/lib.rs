pub mod api_connection;
pub mod backfill;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod nutritional_matcher;
pub mod recipe;
pub mod recipe_aggregator;
pub mod report;
pub mod resolver;
pub mod store;
pub mod units;

#[cfg(test)]
mod test_support;
