mod factory;
mod remote;
mod rules;

pub use factory::ParserFactory;
pub use remote::RemoteParser;
pub use rules::RuleBasedParser;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ParserError;

/// Unified trait for the NLP ingredient parsers the pipeline can call
#[async_trait]
pub trait IngredientParser: Send + Sync {
    /// Get the parser name (e.g., "rules", "remote")
    fn parser_name(&self) -> &str;

    /// Parse one ingredient line whose fractions are already plain text
    async fn parse(&self, text: &str) -> Result<ParsedIngredient, ParserError>;
}

/// What a parser extracted from a single line.
///
/// Every field may be empty; an empty `name` is treated as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    #[serde(default)]
    pub name: Vec<NameSegment>,
    #[serde(default)]
    pub amount: Vec<ParsedAmount>,
    #[serde(default)]
    pub preparation: Option<TextSegment>,
    #[serde(default)]
    pub comment: Option<TextSegment>,
}

impl ParsedIngredient {
    /// First non-blank name segment
    pub fn primary_name(&self) -> Option<&NameSegment> {
        self.name.first().filter(|segment| !segment.text.trim().is_empty())
    }

    /// First amount, if any
    pub fn primary_amount(&self) -> Option<&ParsedAmount> {
        self.amount.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSegment {
    pub text: String,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl NameSegment {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        NameSegment {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAmount {
    #[serde(default)]
    pub quantity: Option<RawQuantity>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ParsedAmount {
    pub fn new(quantity: Option<&str>, unit: Option<&str>) -> Self {
        ParsedAmount {
            quantity: quantity.map(|q| RawQuantity::Text(q.to_string())),
            unit: unit.map(str::to_string),
        }
    }
}

/// Quantity as a parser reports it; remote parsers may send numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Number(f64),
    Text(String),
}

impl fmt::Display for RawQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawQuantity::Number(n) => write!(f, "{}", n),
            RawQuantity::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
}

impl TextSegment {
    pub fn new(text: impl Into<String>) -> Self {
        TextSegment { text: text.into() }
    }
}
