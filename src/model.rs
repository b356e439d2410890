use std::fmt;

use serde::{Deserialize, Serialize};

/// One ingredient after parsing, safety checks and normalization.
///
/// Records are produced per input line and may be replaced by a single
/// consolidated record; they are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIngredient {
    /// Canonical ingredient name, or the verbatim line when `used_fallback` is set
    pub raw_ingredient: String,
    /// Display quantity such as "1 ½"
    pub quantity: Option<String>,
    /// Unit token; `None` for counted or unmeasured ingredients
    pub unit: Option<String>,
    /// Qualifiers like "diced" in first-seen order
    #[serde(default)]
    pub descriptors: Vec<String>,
    /// The input line, or "Combined: ..." for merged records
    pub original_text: String,
    /// Name extraction confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,
    /// The original text was kept because the structured parse was not trusted
    #[serde(default)]
    pub used_fallback: bool,
}

impl StructuredIngredient {
    /// A record with no quantity, unit or descriptors
    pub fn new(raw_ingredient: impl Into<String>, original_text: impl Into<String>) -> Self {
        StructuredIngredient {
            raw_ingredient: raw_ingredient.into(),
            quantity: None,
            unit: None,
            descriptors: Vec::new(),
            original_text: original_text.into(),
            confidence: 0.0,
            used_fallback: false,
        }
    }

    /// A record that preserves `original_text` verbatim as its name
    pub fn fallback(
        original_text: &str,
        quantity: Option<String>,
        unit: Option<String>,
        confidence: f64,
    ) -> Self {
        StructuredIngredient {
            raw_ingredient: original_text.trim().to_string(),
            quantity,
            unit,
            descriptors: Vec::new(),
            original_text: original_text.to_string(),
            confidence,
            used_fallback: true,
        }
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_descriptors<I, S>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptors = descriptors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Whether this record is the result of merging several lines
    pub fn was_combined(&self) -> bool {
        self.original_text
            .starts_with(crate::consolidate::COMBINED_PREFIX)
    }
}

impl fmt::Display for StructuredIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::shopping::format_for_display(self))
    }
}
