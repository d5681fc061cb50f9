use anyhow::{bail, Context, Result};
use foodies_nutrition::backfill::backfill;
use foodies_nutrition::cache::NutritionService;
use foodies_nutrition::cli::{parse_args, Command};
use foodies_nutrition::config::Config;
use foodies_nutrition::data_loader::{load_piece_weights, load_recipes, seed_piece_weights};
use foodies_nutrition::recipe::{clamp_servings, Recipe};
use foodies_nutrition::report::render_table;
use foodies_nutrition::resolver::normalize_name;
use foodies_nutrition::store::{IngredientMapping, MappingStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load_single_recipe(path: &Path) -> Result<Recipe> {
    let mut recipes = load_recipes(path).await?;
    if recipes.len() != 1 {
        bail!("Expected exactly one recipe in {:?}, found {}", path, recipes.len());
    }
    Ok(recipes.remove(0))
}

async fn run(command: Command, config: &Config, store: Arc<SqliteStore>) -> Result<()> {
    match command {
        Command::Compute {
            recipe_file,
            servings,
            key,
            no_cache,
        } => {
            let recipe = load_single_recipe(&recipe_file).await?;
            let (groups, servings, default_key) = match servings {
                Some(requested) => {
                    let target = clamp_servings(requested);
                    (
                        recipe.scaled_ingredients(target),
                        Some(f64::from(target)),
                        format!("{}@{}", recipe.slug, target),
                    )
                }
                None => (recipe.ingredients.clone(), recipe.servings, recipe.slug.clone()),
            };

            let service = NutritionService::from_config(config, store)?;
            let outcome = if no_cache {
                service.compute(&groups, servings).await
            } else {
                let key = key.unwrap_or(default_key);
                service.nutrition_for(&key, &groups, servings).await
            };

            match outcome {
                Ok(result) => {
                    println!("{}", render_table(Some(&result.per_serving), &result.unknown));
                    Ok(())
                }
                Err(e) => {
                    println!("{}", render_table(None, &[]));
                    Err(e).with_context(|| {
                        format!("Failed to compute nutrition for '{}'", recipe.slug)
                    })
                }
            }
        }
        Command::Backfill {
            recipes_file,
            delay_ms,
        } => {
            let recipes = load_recipes(&recipes_file).await?;
            let service = NutritionService::from_config(config, store)?;
            let summary = backfill(&service, &recipes, Duration::from_millis(delay_ms)).await?;
            println!(
                "processed: {}, skipped (fresh): {}, failed: {}",
                summary.processed, summary.skipped_fresh, summary.failed
            );
            Ok(())
        }
        Command::SeedPieceWeights { csv } => {
            let rows = load_piece_weights(&csv)?;
            let count = seed_piece_weights(store.as_ref(), &rows).await?;
            println!("Seeded {} piece weights from {:?}", count, csv);
            Ok(())
        }
        Command::Map { name, fdc_id } => {
            let ingredient_norm = normalize_name(&name);
            if ingredient_norm.is_empty() {
                bail!("Ingredient name must not be empty");
            }
            if fdc_id == 0 {
                bail!("FDC id must be a positive number");
            }
            store
                .upsert_mapping(&IngredientMapping {
                    ingredient_norm: ingredient_norm.clone(),
                    fdc_id,
                    note: Some("manual".to_string()),
                })
                .await
                .with_context(|| format!("Failed to store mapping for '{}'", ingredient_norm))?;
            info!(ingredient = %ingredient_norm, fdc_id, "Mapping updated");
            println!("{} -> {}", ingredient_norm, fdc_id);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = parse_args();
    init_tracing(cli.verbose);

    let mut config = Config::from_env();
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key.trim().to_string();
    }

    let store = SqliteStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database at '{}'", config.database_url))?;
    store
        .migrate()
        .await
        .context("Failed to prepare database schema")?;
    let store = Arc::new(store);

    let outcome = run(cli.command, &config, store.clone()).await;
    store.close().await;
    outcome
}
