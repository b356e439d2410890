use std::env;
use std::io::Read;

use ingredient_normalizer::{shopping_list_items, IngredientPipeline, NormalizerConfig};
use log::{info, warn};

const USAGE: &str = "Usage: ingredient-normalizer [FILE] [--json]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ if path.is_none() => path = Some(arg),
            _ => return Err(USAGE.into()),
        }
    }

    // One ingredient per line, from FILE or stdin
    let input = match &path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let lines: Vec<&str> = input.lines().collect();

    let config = NormalizerConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        NormalizerConfig::default()
    });
    let pipeline = IngredientPipeline::builder().config(&config).build()?;
    info!("Normalizing {} lines with {:?}", lines.len(), pipeline);

    let ingredients = pipeline.process(&lines).await;

    if json {
        let items = shopping_list_items(&ingredients);
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for ingredient in &ingredients {
            if ingredient.used_fallback {
                println!("{}  [kept as written]", ingredient);
            } else {
                println!("{}", ingredient);
            }
        }
    }

    Ok(())
}
