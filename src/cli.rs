use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::backfill::DEFAULT_DELAY_MS;
use crate::config::{API_KEY_ENV_VAR, DATABASE_URL_ENV_VAR};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Recipe nutrition from USDA FoodData Central",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, env = DATABASE_URL_ENV_VAR)]
    pub database_url: Option<String>,

    #[arg(long, global = true, env = API_KEY_ENV_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute nutrition for one recipe JSON file
    Compute {
        #[arg(short, long)]
        recipe_file: PathBuf,

        /// Rescale the recipe to this many servings (1-20) first
        #[arg(short, long)]
        servings: Option<i64>,

        /// Read and write the result cache under this key; defaults to the slug
        #[arg(short, long)]
        key: Option<String>,

        /// Skip the result cache entirely
        #[arg(long, conflicts_with = "key")]
        no_cache: bool,
    },
    /// Compute and cache every recipe whose cached result is missing or stale
    Backfill {
        #[arg(short, long)]
        recipes_file: PathBuf,

        #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
        delay_ms: u64,
    },
    /// Load grams-per-piece weights from a name,grams_per_piece CSV
    SeedPieceWeights {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Point an ingredient name at a specific FDC food
    Map {
        #[arg(long)]
        name: String,

        /// FDC food id; 0 is not a food
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        fdc_id: u64,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
