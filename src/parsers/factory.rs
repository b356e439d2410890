use std::sync::Arc;

use crate::config::ParserConfig;
use crate::error::ParserError;
use crate::parsers::{IngredientParser, RemoteParser, RuleBasedParser};

pub struct ParserFactory;

impl ParserFactory {
    /// Create a parser instance from configuration
    pub fn create(config: &ParserConfig) -> Result<Arc<dyn IngredientParser>, ParserError> {
        match config.kind.as_str() {
            "rules" => Ok(Arc::new(RuleBasedParser::new())),
            "remote" => Ok(Arc::new(RemoteParser::new(config)?)),
            other => Err(ParserError::InvalidConfig(format!(
                "Unknown parser kind: {}",
                other
            ))),
        }
    }

    /// List all available parser kinds
    pub fn available_parsers() -> Vec<&'static str> {
        vec!["rules", "remote"]
    }
}
