use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ingredient_normalizer::parsers::{NameSegment, ParsedAmount};
use ingredient_normalizer::{
    format_for_display, parse_ingredients, raw_ingredients_for_search, IngredientParser,
    IngredientPipeline, ParsedIngredient, ParserError,
};

/// Stands in for the NLP parser with fixed answers per line
struct ScriptedParser {
    answers: HashMap<&'static str, (&'static str, f64, Option<&'static str>, Option<&'static str>)>,
}

impl ScriptedParser {
    fn new(
        answers: &[(&'static str, &'static str, f64, Option<&'static str>, Option<&'static str>)],
    ) -> Arc<Self> {
        Arc::new(ScriptedParser {
            answers: answers
                .iter()
                .map(|(line, name, confidence, quantity, unit)| {
                    (*line, (*name, *confidence, *quantity, *unit))
                })
                .collect(),
        })
    }
}

#[async_trait]
impl IngredientParser for ScriptedParser {
    fn parser_name(&self) -> &str {
        "scripted"
    }

    async fn parse(&self, text: &str) -> Result<ParsedIngredient, ParserError> {
        let (name, confidence, quantity, unit) = self
            .answers
            .get(text)
            .ok_or_else(|| ParserError::Failed(format!("unscripted line '{}'", text)))?;

        Ok(ParsedIngredient {
            name: vec![NameSegment::new(*name, *confidence)],
            amount: vec![ParsedAmount::new(*quantity, *unit)],
            ..Default::default()
        })
    }
}

fn scripted_pipeline(parser: Arc<ScriptedParser>) -> IngredientPipeline {
    IngredientPipeline::builder().parser(parser).build().unwrap()
}

#[tokio::test]
async fn test_eggplant_misread_as_eggs_is_kept_verbatim() {
    let parser = ScriptedParser::new(&[
        ("2 medium eggplant", "eggs", 0.97, Some("2"), None),
        ("3 large eggs", "large eggs", 0.98, Some("3"), None),
    ]);

    let result = scripted_pipeline(parser)
        .process(&["2 medium eggplant", "3 large eggs"])
        .await;

    assert_eq!(result.len(), 2);

    let eggplant = &result[0];
    assert!(eggplant.used_fallback);
    assert_eq!(eggplant.raw_ingredient, "2 medium eggplant");
    assert_ne!(eggplant.raw_ingredient, "eggs");
    assert_eq!(format_for_display(eggplant), "2 medium eggplant");

    let eggs = &result[1];
    assert!(!eggs.used_fallback);
    assert_eq!(eggs.raw_ingredient, "eggs");
    assert_eq!(eggs.quantity.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_eggplant_with_default_pipeline() {
    let result = parse_ingredients(&["2 medium eggplant, diced", "3 large eggs"]).await;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].raw_ingredient, "eggplant");
    assert_eq!(result[0].descriptors, vec!["medium", "diced"]);
    assert_eq!(result[1].raw_ingredient, "eggs");
}

#[tokio::test]
async fn test_flour_consolidates_to_mixed_number() {
    let result = parse_ingredients(&["1 cup flour", "1/2 cup flour"]).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].raw_ingredient, "flour");
    assert_eq!(result[0].unit.as_deref(), Some("cup"));
    assert_eq!(result[0].quantity.as_deref(), Some("1 ½"));
    assert_eq!(result[0].original_text, "Combined: 1 cup flour, 1/2 cup flour");
    assert_eq!(format_for_display(&result[0]), "1 ½ cup flour");
}

#[tokio::test]
async fn test_unicode_fractions_consolidate() {
    let result = parse_ingredients(&["1½ cups sugar", "¼ cup sugar", "1 cup granulated sugar"]).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].raw_ingredient, "sugar");
    assert_eq!(result[0].quantity.as_deref(), Some("2 ¾"));
}

#[tokio::test]
async fn test_coconut_milk_misread_as_milk() {
    let parser = ScriptedParser::new(&[("1 cup coconut milk", "milk", 0.95, Some("1"), Some("cup"))]);

    let result = scripted_pipeline(parser).process(&["1 cup coconut milk"]).await;

    assert_eq!(result.len(), 1);
    assert!(result[0].used_fallback);
    assert_eq!(result[0].raw_ingredient, "1 cup coconut milk");
    assert_eq!(result[0].quantity.as_deref(), Some("1"));
    assert_eq!(result[0].unit.as_deref(), Some("cup"));
    assert_eq!(result[0].confidence, 0.95);
}

#[tokio::test]
async fn test_water_is_dropped() {
    let result = parse_ingredients(&["water", "2 cups flour"]).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].raw_ingredient, "flour");
    assert_eq!(raw_ingredients_for_search(&result), vec!["flour"]);
}

#[tokio::test]
async fn test_water_inside_a_phrase_is_dropped_but_watermelon_kept() {
    let result = parse_ingredients(&["1 cup ice water", "2 cups watermelon, cubed"]).await;

    assert_eq!(raw_ingredients_for_search(&result), vec!["watermelon"]);
}

#[tokio::test]
async fn test_empty_and_blank_lines_are_skipped() {
    let result = parse_ingredients(&["", "   ", "1 tsp salt", "\t"]).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].raw_ingredient, "salt");
    assert_eq!(result[0].unit.as_deref(), Some("teaspoon"));
}

#[tokio::test]
async fn test_empty_list() {
    let lines: Vec<String> = Vec::new();
    assert!(parse_ingredients(&lines).await.is_empty());
}

#[tokio::test]
async fn test_egg_variants_fold_together() {
    let result = parse_ingredients(&["2 eggs", "1 large egg", "3 egg"]).await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].raw_ingredient, "eggs");
    assert_eq!(result[0].quantity.as_deref(), Some("6"));
    assert!(result[0].was_combined());
}

#[tokio::test]
async fn test_same_name_different_units_stay_apart() {
    let result = parse_ingredients(&["2 cups flour", "8 oz flour", "1 cup flour"]).await;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].unit.as_deref(), Some("cup"));
    assert_eq!(result[0].quantity.as_deref(), Some("3"));
    assert_eq!(result[1].unit.as_deref(), Some("ounce"));
    assert_eq!(result[1].quantity.as_deref(), Some("8"));
}

#[tokio::test]
async fn test_hyphenated_mixed_number_keeps_its_fraction() {
    let result = parse_ingredients(&["1-1/2 cups flour", "1/2 cup flour"]).await;

    assert_eq!(result.len(), 1);
    assert!(!result[0].used_fallback);
    assert_eq!(result[0].quantity.as_deref(), Some("2"));
    assert_eq!(result[0].unit.as_deref(), Some("cup"));
}
