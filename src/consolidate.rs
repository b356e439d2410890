use std::collections::HashMap;

use log::debug;

use crate::fraction::combine_quantities;
use crate::model::StructuredIngredient;

/// Prefix of the audit text on merged records
pub const COMBINED_PREFIX: &str = "Combined: ";

/// Whether two records may be merged: same canonical name and same unit
/// (two absent units count as the same).
pub fn can_combine(a: &StructuredIngredient, b: &StructuredIngredient) -> bool {
    a.raw_ingredient == b.raw_ingredient && a.unit == b.unit
}

/// Merge every group of records that share name and unit.
///
/// Groups come out in the order their first member arrived.
pub fn consolidate(ingredients: Vec<StructuredIngredient>) -> Vec<StructuredIngredient> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<StructuredIngredient>> = Vec::new();

    for ingredient in ingredients {
        match index.get(&ingredient.raw_ingredient) {
            Some(&slot) => groups[slot].push(ingredient),
            None => {
                index.insert(ingredient.raw_ingredient.clone(), groups.len());
                groups.push(vec![ingredient]);
            }
        }
    }

    groups.into_iter().flat_map(consolidate_group).collect()
}

/// Merge records of a single canonical name, one output per distinct unit
pub fn consolidate_group(group: Vec<StructuredIngredient>) -> Vec<StructuredIngredient> {
    if group.len() <= 1 {
        return group;
    }

    let mut by_unit: Vec<(Option<String>, Vec<StructuredIngredient>)> = Vec::new();
    for ingredient in group {
        match by_unit.iter_mut().find(|(unit, _)| *unit == ingredient.unit) {
            Some((_, members)) => members.push(ingredient),
            None => by_unit.push((ingredient.unit.clone(), vec![ingredient])),
        }
    }

    by_unit
        .into_iter()
        .filter_map(|(_, members)| merge(members))
        .collect()
}

fn merge(mut members: Vec<StructuredIngredient>) -> Option<StructuredIngredient> {
    if members.len() <= 1 {
        return members.pop();
    }

    let quantity = members
        .iter()
        .skip(1)
        .fold(members[0].quantity.clone(), |total, next| {
            combine_quantities(total.as_deref(), next.quantity.as_deref())
        });

    let mut descriptors: Vec<String> = Vec::new();
    for descriptor in members.iter().flat_map(|m| m.descriptors.iter()) {
        if !descriptors.contains(descriptor) {
            descriptors.push(descriptor.clone());
        }
    }

    let confidence = members
        .iter()
        .map(|m| m.confidence)
        .fold(f64::INFINITY, f64::min);
    let used_fallback = members.iter().any(|m| m.used_fallback);
    let sources: Vec<&str> = members.iter().map(|m| m.original_text.as_str()).collect();
    let original_text = format!("{}{}", COMBINED_PREFIX, sources.join(", "));

    let first = &members[0];
    debug!(
        "Combined {} x '{}' ({:?}) into quantity {:?}",
        members.len(),
        first.raw_ingredient,
        first.unit,
        quantity
    );

    Some(StructuredIngredient {
        raw_ingredient: first.raw_ingredient.clone(),
        quantity,
        unit: first.unit.clone(),
        descriptors,
        original_text,
        confidence,
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flour(quantity: &str, unit: &str, original: &str) -> StructuredIngredient {
        StructuredIngredient::new("flour", original)
            .with_quantity(quantity)
            .with_unit(unit)
            .with_confidence(0.9)
    }

    #[test]
    fn test_can_combine_same_ingredient_same_unit() {
        assert!(can_combine(
            &flour("1", "cup", "1 cup flour"),
            &flour("2", "cup", "2 cups flour")
        ));
    }

    #[test]
    fn test_can_combine_unitless() {
        let a = StructuredIngredient::new("eggs", "2 eggs").with_quantity("2");
        let b = StructuredIngredient::new("eggs", "3 eggs").with_quantity("3");
        assert!(can_combine(&a, &b));
    }

    #[test]
    fn test_cannot_combine_different_names_or_units() {
        let sugar = StructuredIngredient::new("sugar", "1 cup sugar")
            .with_quantity("1")
            .with_unit("cup");
        assert!(!can_combine(&flour("1", "cup", "1 cup flour"), &sugar));
        assert!(!can_combine(
            &flour("1", "cup", "1 cup flour"),
            &flour("16", "ounce", "16 oz flour")
        ));
        let unitless = StructuredIngredient::new("flour", "flour");
        assert!(!can_combine(&flour("1", "cup", "1 cup flour"), &unitless));
    }

    #[test]
    fn test_consolidate_single_ingredient() {
        let ingredient = flour("2", "cup", "2 cups flour");
        assert_eq!(consolidate_group(vec![ingredient.clone()]), vec![ingredient]);
    }

    #[test]
    fn test_consolidate_same_unit() {
        let a = flour("1", "cup", "1 cup flour");
        let b = flour("½", "cup", "½ cup flour").with_confidence(0.8);

        let result = consolidate_group(vec![a, b]);
        assert_eq!(result.len(), 1);

        let merged = &result[0];
        assert_eq!(merged.raw_ingredient, "flour");
        assert_eq!(merged.quantity.as_deref(), Some("1 ½"));
        assert_eq!(merged.unit.as_deref(), Some("cup"));
        assert_eq!(merged.confidence, 0.8);
        assert_eq!(merged.original_text, "Combined: 1 cup flour, ½ cup flour");
        assert!(merged.was_combined());
        assert!(!merged.used_fallback);
    }

    #[test]
    fn test_consolidate_three_way_fold() {
        let result = consolidate(vec![
            flour("1", "cup", "1 cup flour"),
            flour("½", "cup", "½ cup flour"),
            flour("1", "cup", "1 cup flour"),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].quantity.as_deref(), Some("2 ½"));
    }

    #[test]
    fn test_consolidate_different_units_stay_separate() {
        let result = consolidate_group(vec![
            flour("1", "cup", "1 cup flour"),
            flour("8", "ounce", "8 oz flour"),
        ]);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| !r.was_combined()));
    }

    #[test]
    fn test_descriptors_union_in_first_seen_order() {
        let a = StructuredIngredient::new("onion", "1 onion, diced")
            .with_quantity("1")
            .with_descriptors(["large", "diced"]);
        let b = StructuredIngredient::new("onion", "1 onion, minced")
            .with_quantity("1")
            .with_descriptors(["small", "diced", "minced"]);

        let result = consolidate(vec![a, b]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].quantity.as_deref(), Some("2"));
        assert_eq!(result[0].descriptors, vec!["large", "diced", "small", "minced"]);
    }

    #[test]
    fn test_fallback_contaminates_merge() {
        let parsed = StructuredIngredient::new("eggs", "2 eggs")
            .with_quantity("2")
            .with_confidence(0.95);
        let protected = StructuredIngredient::fallback(" eggs ", Some("1".to_string()), None, 0.9);

        let result = consolidate(vec![parsed, protected]);
        assert_eq!(result.len(), 1);
        assert!(result[0].used_fallback);
        assert_eq!(result[0].confidence, 0.9);
        assert_eq!(result[0].quantity.as_deref(), Some("3"));
    }

    #[test]
    fn test_missing_and_non_numeric_quantities() {
        let result = consolidate(vec![
            StructuredIngredient::new("salt", "salt"),
            StructuredIngredient::new("salt", "1 pinch salt").with_quantity("a little"),
            StructuredIngredient::new("salt", "1 tsp salt").with_quantity("1"),
        ]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].quantity.as_deref(), Some("a little + 1"));
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let result = consolidate(vec![
            StructuredIngredient::new("sugar", "sugar"),
            flour("1", "cup", "1 cup flour"),
            StructuredIngredient::new("sugar", "sugar"),
        ]);
        let names: Vec<&str> = result.iter().map(|r| r.raw_ingredient.as_str()).collect();
        assert_eq!(names, vec!["sugar", "flour"]);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let once = consolidate(vec![
            flour("1", "cup", "1 cup flour"),
            flour("1/2", "cup", "1/2 cup flour"),
            flour("8", "ounce", "8 oz flour"),
            StructuredIngredient::new("eggs", "3 eggs").with_quantity("3"),
        ]);
        let twice = consolidate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(Vec::new()).is_empty());
    }
}
