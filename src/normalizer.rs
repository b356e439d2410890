use std::collections::HashMap;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

lazy_static! {
    static ref FOOTNOTE_MARKERS: Regex = Regex::new(r"\*+").expect("footnote pattern is valid");
}

/// Variant name → canonical name table.
///
/// Lookup is by whole cleaned name only, never by substring, so "eggplant"
/// can not fold into "eggs".
#[derive(Debug, Clone, Default)]
pub struct ConsolidationRules {
    variants: HashMap<String, String>,
}

impl ConsolidationRules {
    /// A table with no groups; every name maps to itself
    pub fn empty() -> Self {
        ConsolidationRules::default()
    }

    /// Register a canonical name and the variants that fold into it.
    ///
    /// The canonical name is always a variant of itself.
    pub fn with_group<I, S>(mut self, canonical: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = canonical.trim().to_lowercase();
        let variants = variants
            .into_iter()
            .map(|v| v.as_ref().trim().to_lowercase())
            .chain(std::iter::once(canonical.clone()));

        for variant in variants {
            if let Some(previous) = self.variants.get(&variant) {
                if *previous != canonical {
                    warn!(
                        "Variant '{}' moved from '{}' to '{}'",
                        variant, previous, canonical
                    );
                }
            }
            self.variants.insert(variant, canonical.clone());
        }
        self
    }

    /// Exact lookup of an already-cleaned name
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        self.variants.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The built-in groups
    pub fn builtin() -> Self {
        ConsolidationRules::empty()
            .with_group(
                "eggs",
                ["egg", "eggs", "whole egg", "whole eggs", "large egg", "large eggs"],
            )
            .with_group("butter", ["butter", "unsalted butter", "salted butter"])
            .with_group(
                "sugar",
                ["sugar", "granulated sugar", "white sugar", "cane sugar"],
            )
            .with_group(
                "brown sugar",
                ["brown sugar", "dark brown sugar", "light brown sugar"],
            )
            .with_group(
                "salt",
                ["salt", "kosher salt", "sea salt", "table salt", "fine salt"],
            )
            .with_group("olive oil", ["olive oil", "extra virgin olive oil", "evoo"])
    }
}

/// Ingredients that never make it into a structured list
pub fn default_ignored_ingredients() -> Vec<String> {
    vec!["water".to_string()]
}

/// Cleans names, drops ignored ingredients and applies consolidation groups
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    consolidation: ConsolidationRules,
    ignored: Vec<String>,
}

impl NameNormalizer {
    pub fn new<I, S>(consolidation: ConsolidationRules, ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        NameNormalizer {
            consolidation,
            ignored: ignored
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn consolidation(&self) -> &ConsolidationRules {
        &self.consolidation
    }

    /// Canonical form of `name`, or `None` when the ingredient is ignored
    pub fn normalize(&self, name: &str) -> Option<String> {
        let lowered = name.trim().to_lowercase();
        let cleaned = FOOTNOTE_MARKERS.replace_all(&lowered, "").trim().to_string();

        if self.is_ignored(&cleaned) {
            debug!("Dropping ignored ingredient '{}'", name);
            return None;
        }

        match self.consolidation.canonical_for(&cleaned) {
            Some(canonical) => {
                debug!("Consolidated '{}' -> '{}'", cleaned, canonical);
                Some(canonical.to_string())
            }
            None => Some(cleaned),
        }
    }

    // Whole-word match, so "ice water" is dropped but "watermelon" is kept.
    fn is_ignored(&self, cleaned: &str) -> bool {
        self.ignored.iter().any(|ignored| {
            let words: Vec<&str> = ignored.split_whitespace().collect();
            let tokens: Vec<&str> = cleaned
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| !t.is_empty())
                .collect();
            !words.is_empty() && tokens.windows(words.len()).any(|window| window == words.as_slice())
        })
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        NameNormalizer::new(ConsolidationRules::builtin(), default_ignored_ingredients())
    }
}
