use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

use crate::safety::DietaryRule;

/// Main normalizer configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct NormalizerConfig {
    /// Parser confidence below which a line keeps its original text
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Per-line parser timeout in milliseconds
    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,
    /// Maximum number of lines parsed at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Which parser to use and how to reach it
    #[serde(default)]
    pub parser: ParserConfig,
    /// Words that drop an ingredient from the structured list
    #[serde(default = "default_ignored_ingredients")]
    pub ignored_ingredients: Vec<String>,
    /// Extra canonical name → variants groups, merged into the built-in groups
    #[serde(default)]
    pub consolidation: HashMap<String, Vec<String>>,
    /// Extra dietary misparse rules, appended to the built-in rules
    #[serde(default)]
    pub dietary_rules: Vec<DietaryRule>,
}

/// Configuration for the NLP parser backend
#[derive(Debug, Deserialize, Clone)]
pub struct ParserConfig {
    /// Parser kind: "rules" (offline) or "remote" (HTTP service)
    #[serde(default = "default_parser_kind")]
    pub kind: String,
    /// Base URL of the remote parsing service
    pub base_url: Option<String>,
    /// Endpoint path on the remote service (defaults to "/parse")
    pub endpoint: Option<String>,
    /// Bearer token for the remote service
    pub api_key: Option<String>,
    /// HTTP timeout for a single remote request in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            kind: default_parser_kind(),
            base_url: None,
            endpoint: None,
            api_key: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            parse_timeout_ms: default_parse_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            parser: ParserConfig::default(),
            ignored_ingredients: default_ignored_ingredients(),
            consolidation: HashMap::new(),
            dietary_rules: Vec::new(),
        }
    }
}

// Default value functions
fn default_confidence_threshold() -> f64 {
    0.6
}

fn default_parse_timeout_ms() -> u64 {
    5000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_parser_kind() -> String {
    "rules".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_ignored_ingredients() -> Vec<String> {
    crate::normalizer::default_ignored_ingredients()
}

impl NormalizerConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with INGREDIENTS__ prefix
    /// 2. ingredients.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: INGREDIENTS__PARSER__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`NormalizerConfig::load`] for the precedence rules.
pub fn load_config() -> Result<NormalizerConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("ingredients").required(false))
        // Use double underscore for nested: INGREDIENTS__PARSER__KIND
        .add_source(
            Environment::with_prefix("INGREDIENTS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
