pub mod builder;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod fraction;
pub mod model;
pub mod normalizer;
pub mod parsers;
pub mod pipeline;
pub mod safety;
pub mod shopping;

pub use builder::IngredientPipelineBuilder;
pub use config::{load_config, NormalizerConfig, ParserConfig};
pub use consolidate::{can_combine, consolidate, consolidate_group};
pub use error::{NormalizeError, ParserError};
pub use fraction::{combine_quantities, normalize_for_parsing, to_display_fraction};
pub use model::StructuredIngredient;
pub use normalizer::{ConsolidationRules, NameNormalizer};
pub use parsers::{
    IngredientParser, ParsedIngredient, ParserFactory, RemoteParser, RuleBasedParser,
};
pub use pipeline::{FallbackReason, IngredientPipeline, LineOutcome};
pub use safety::{DietaryRule, DietaryRules, MisparseCheck, Severity};
pub use shopping::{
    format_for_display, raw_ingredients_for_search, shopping_list_items, ShoppingListItem,
};

/// Parse and consolidate ingredient lines with the default pipeline.
///
/// Uses the offline rule-based parser, the built-in dietary rules and
/// consolidation groups, and drops water.
///
/// # Example
/// ```
/// # #[tokio::main]
/// # async fn main() {
/// let ingredients =
///     ingredient_normalizer::parse_ingredients(&["1 cup flour", "1/2 cup flour"]).await;
/// assert_eq!(ingredients.len(), 1);
/// assert_eq!(ingredients[0].quantity.as_deref(), Some("1 ½"));
/// # }
/// ```
pub async fn parse_ingredients<S: AsRef<str>>(lines: &[S]) -> Vec<StructuredIngredient> {
    IngredientPipeline::default().process(lines).await
}

/// Parse and consolidate ingredient lines with a pipeline built from `config`
pub async fn parse_ingredients_with_config<S: AsRef<str>>(
    lines: &[S],
    config: &NormalizerConfig,
) -> Result<Vec<StructuredIngredient>, NormalizeError> {
    let pipeline = IngredientPipeline::builder().config(config).build()?;
    Ok(pipeline.process(lines).await)
}
