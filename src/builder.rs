use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::config::{NormalizerConfig, ParserConfig};
use crate::error::NormalizeError;
use crate::normalizer::{default_ignored_ingredients, ConsolidationRules, NameNormalizer};
use crate::parsers::{IngredientParser, ParserFactory, RuleBasedParser};
use crate::pipeline::{
    IngredientPipeline, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PARSE_TIMEOUT,
};
use crate::safety::{DietaryRule, DietaryRules};

/// Builder for configuring an [`IngredientPipeline`]
pub struct IngredientPipelineBuilder {
    parser: Option<Arc<dyn IngredientParser>>,
    parser_config: Option<ParserConfig>,
    confidence_threshold: f64,
    timeout: Option<Duration>,
    max_concurrency: usize,
    dietary_rules: DietaryRules,
    consolidation: ConsolidationRules,
    ignored: Vec<String>,
}

impl Default for IngredientPipelineBuilder {
    fn default() -> Self {
        IngredientPipelineBuilder {
            parser: None,
            parser_config: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            timeout: Some(DEFAULT_PARSE_TIMEOUT),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            dietary_rules: DietaryRules::default(),
            consolidation: ConsolidationRules::builtin(),
            ignored: default_ignored_ingredients(),
        }
    }
}

impl IngredientPipelineBuilder {
    /// Use a specific parser instead of the offline rule-based one
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use ingredient_normalizer::{IngredientPipeline, RuleBasedParser};
    ///
    /// let builder = IngredientPipeline::builder()
    ///     .parser(Arc::new(RuleBasedParser::new()));
    /// ```
    pub fn parser(mut self, parser: Arc<dyn IngredientParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Create the parser from configuration when `build` runs.
    ///
    /// Ignored when an explicit parser was set with [`Self::parser`].
    pub fn parser_config(mut self, config: ParserConfig) -> Self {
        self.parser_config = Some(config);
        self
    }

    /// Parser confidence below which a line keeps its original text
    ///
    /// # Example
    /// ```
    /// use ingredient_normalizer::IngredientPipeline;
    ///
    /// let pipeline = IngredientPipeline::builder()
    ///     .confidence_threshold(0.8)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(pipeline.confidence_threshold(), 0.8);
    /// ```
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Upper bound on a single parser call
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Let parser calls run as long as they need
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Maximum number of lines parsed at the same time
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Replace the dietary rule table, including the built-in rules
    pub fn dietary_rules(mut self, rules: DietaryRules) -> Self {
        self.dietary_rules = rules;
        self
    }

    /// Add one rule on top of the current table
    pub fn dietary_rule(mut self, rule: DietaryRule) -> Self {
        self.dietary_rules = self.dietary_rules.with_rule(rule);
        self
    }

    /// Replace the consolidation table, including the built-in groups
    pub fn consolidation_rules(mut self, rules: ConsolidationRules) -> Self {
        self.consolidation = rules;
        self
    }

    /// Add one canonical name and its variants to the current table
    ///
    /// # Example
    /// ```
    /// use ingredient_normalizer::IngredientPipeline;
    ///
    /// let builder = IngredientPipeline::builder()
    ///     .consolidation_group("scallions", ["green onions", "spring onions"]);
    /// ```
    pub fn consolidation_group<I, S>(mut self, canonical: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.consolidation = self.consolidation.with_group(canonical, variants);
        self
    }

    /// Names dropped from the structured list entirely
    pub fn ignored_ingredients<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored = names.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Apply a loaded configuration.
    ///
    /// Configured consolidation groups and dietary rules are added on top of
    /// the built-in ones. A zero `parse_timeout_ms` disables the timeout.
    pub fn config(mut self, config: &NormalizerConfig) -> Self {
        self.confidence_threshold = config.confidence_threshold;
        self.timeout = match config.parse_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        self.max_concurrency = config.max_concurrency;
        self.parser_config = Some(config.parser.clone());
        self.ignored = config.ignored_ingredients.clone();

        // Sorted so that a variant listed twice always lands in the same group
        let mut groups: Vec<_> = config.consolidation.iter().collect();
        groups.sort_by(|a, b| a.0.cmp(b.0));
        for (canonical, variants) in groups {
            self.consolidation = self.consolidation.with_group(canonical, variants);
        }

        self.dietary_rules = self
            .dietary_rules
            .extend(config.dietary_rules.iter().cloned());
        self
    }

    /// Validate the settings and assemble the pipeline
    ///
    /// # Errors
    /// Returns `NormalizeError` if:
    /// - The confidence threshold is not a number in `[0, 1]`
    /// - `max_concurrency` is zero
    /// - A configured parser cannot be created
    pub fn build(self) -> Result<IngredientPipeline, NormalizeError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(NormalizeError::BuilderError(format!(
                "Confidence threshold must be between 0 and 1, got {}",
                self.confidence_threshold
            )));
        }

        if self.max_concurrency == 0 {
            return Err(NormalizeError::BuilderError(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let parser = match (self.parser, self.parser_config) {
            (Some(parser), _) => parser,
            (None, Some(config)) => ParserFactory::create(&config)?,
            (None, None) => Arc::new(RuleBasedParser::new()),
        };

        debug!(
            "Building pipeline with '{}' parser, {} dietary rules, {} consolidation variants",
            parser.parser_name(),
            self.dietary_rules.rules().len(),
            self.consolidation.len()
        );

        let normalizer = NameNormalizer::new(self.consolidation, self.ignored);
        Ok(
            IngredientPipeline::new(parser, self.dietary_rules, normalizer).with_limits(
                self.confidence_threshold,
                self.timeout,
                self.max_concurrency,
            ),
        )
    }
}

impl IngredientPipeline {
    /// Creates a new builder for ingredient pipelines
    ///
    /// # Example
    /// ```
    /// use ingredient_normalizer::IngredientPipeline;
    ///
    /// let builder = IngredientPipeline::builder();
    /// ```
    pub fn builder() -> IngredientPipelineBuilder {
        IngredientPipelineBuilder::default()
    }
}
