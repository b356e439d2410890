use serde::Serialize;

use crate::model::StructuredIngredient;

/// Render a record as a shopping list line.
///
/// Fallback records print their preserved text verbatim; everything else is
/// "[quantity] [unit] name" with absent parts left out.
pub fn format_for_display(ingredient: &StructuredIngredient) -> String {
    if ingredient.used_fallback {
        return ingredient.raw_ingredient.clone();
    }

    let mut parts: Vec<&str> = Vec::with_capacity(3);
    if let Some(quantity) = ingredient.quantity.as_deref().filter(|q| !q.is_empty()) {
        parts.push(quantity);
    }
    if let Some(unit) = ingredient.unit.as_deref().filter(|u| !u.is_empty()) {
        parts.push(unit);
    }
    parts.push(&ingredient.raw_ingredient);

    parts.join(" ")
}

/// Flattened ingredient names for recipe search and filtering
pub fn raw_ingredients_for_search(ingredients: &[StructuredIngredient]) -> Vec<String> {
    ingredients
        .iter()
        .map(|ingredient| ingredient.raw_ingredient.clone())
        .collect()
}

/// One shopping list entry as handed to presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub descriptors: Vec<String>,
    pub original: String,
    pub confidence: f64,
    pub shopping_display: String,
    pub used_fallback: bool,
    pub was_combined: bool,
}

impl From<&StructuredIngredient> for ShoppingListItem {
    fn from(ingredient: &StructuredIngredient) -> Self {
        ShoppingListItem {
            name: ingredient.raw_ingredient.clone(),
            quantity: ingredient.quantity.clone(),
            unit: ingredient.unit.clone(),
            descriptors: ingredient.descriptors.clone(),
            original: ingredient.original_text.clone(),
            confidence: ingredient.confidence,
            shopping_display: format_for_display(ingredient),
            used_fallback: ingredient.used_fallback,
            was_combined: ingredient.was_combined(),
        }
    }
}

pub fn shopping_list_items(ingredients: &[StructuredIngredient]) -> Vec<ShoppingListItem> {
    ingredients.iter().map(ShoppingListItem::from).collect()
}
