use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::consolidate::consolidate;
use crate::error::ParserError;
use crate::fraction::{normalize_for_parsing, to_display_fraction};
use crate::model::StructuredIngredient;
use crate::normalizer::NameNormalizer;
use crate::parsers::{IngredientParser, ParsedIngredient, RuleBasedParser};
use crate::safety::DietaryRules;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
pub const DEFAULT_PARSE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Why a line kept its original text
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// The parser failed, timed out, or extracted no name
    ParseFailure(String),
    /// The dietary safety filter rejected the parsed name
    SafetyOverride(String),
    /// The parser was not confident enough in the name
    LowConfidence { confidence: f64, threshold: f64 },
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ParseFailure(message) => write!(f, "parse failure: {}", message),
            FallbackReason::SafetyOverride(reason) => write!(f, "safety override: {}", reason),
            FallbackReason::LowConfidence {
                confidence,
                threshold,
            } => write!(f, "low confidence ({:.3} < {:.3})", confidence, threshold),
        }
    }
}

/// Terminal state of one input line.
///
/// Parser errors, timeouts and panics all end in `Fallback`, so a list always
/// parses completely.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed(StructuredIngredient),
    Fallback {
        ingredient: StructuredIngredient,
        reason: FallbackReason,
    },
    /// Recognized but intentionally excluded, e.g. water
    Dropped { name: String },
    /// Blank line
    Empty,
}

impl LineOutcome {
    /// Fallback with zero confidence and no amount
    pub fn parse_failure(original: &str, message: impl Into<String>) -> Self {
        LineOutcome::Fallback {
            ingredient: StructuredIngredient::fallback(original, None, None, 0.0),
            reason: FallbackReason::ParseFailure(message.into()),
        }
    }

    pub fn ingredient(&self) -> Option<&StructuredIngredient> {
        match self {
            LineOutcome::Parsed(ingredient) | LineOutcome::Fallback { ingredient, .. } => {
                Some(ingredient)
            }
            LineOutcome::Dropped { .. } | LineOutcome::Empty => None,
        }
    }

    pub fn into_ingredient(self) -> Option<StructuredIngredient> {
        match self {
            LineOutcome::Parsed(ingredient) | LineOutcome::Fallback { ingredient, .. } => {
                Some(ingredient)
            }
            LineOutcome::Dropped { .. } | LineOutcome::Empty => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LineOutcome::Fallback { .. })
    }
}

/// Turns ingredient lines into structured, consolidated records.
///
/// Cheap to clone; the parser and rule tables are shared.
#[derive(Clone)]
pub struct IngredientPipeline {
    parser: Arc<dyn IngredientParser>,
    safety: Arc<DietaryRules>,
    normalizer: Arc<NameNormalizer>,
    confidence_threshold: f64,
    timeout: Option<Duration>,
    max_concurrency: usize,
}

impl IngredientPipeline {
    /// Pipeline with default threshold, timeout and concurrency.
    ///
    /// Use [`IngredientPipeline::builder`] to change those.
    pub fn new(
        parser: Arc<dyn IngredientParser>,
        safety: DietaryRules,
        normalizer: NameNormalizer,
    ) -> Self {
        IngredientPipeline {
            parser,
            safety: Arc::new(safety),
            normalizer: Arc::new(normalizer),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            timeout: Some(DEFAULT_PARSE_TIMEOUT),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub(crate) fn with_limits(
        mut self,
        confidence_threshold: f64,
        timeout: Option<Duration>,
        max_concurrency: usize,
    ) -> Self {
        self.confidence_threshold = confidence_threshold;
        self.timeout = timeout;
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn parser_name(&self) -> &str {
        self.parser.parser_name()
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Parse, protect, normalize and consolidate a list of lines.
    ///
    /// Never fails; unparsable lines come back as fallback records. Must be
    /// called from within a tokio runtime.
    pub async fn process<S: AsRef<str>>(&self, lines: &[S]) -> Vec<StructuredIngredient> {
        let structured: Vec<StructuredIngredient> = self
            .parse_lines(lines)
            .await
            .into_iter()
            .filter_map(LineOutcome::into_ingredient)
            .collect();

        let consolidated = consolidate(structured);
        info!(
            "Processed {} lines into {} ingredients ({} fallback)",
            lines.len(),
            consolidated.len(),
            consolidated.iter().filter(|i| i.used_fallback).count()
        );
        consolidated
    }

    /// Parse every line concurrently; outcomes are in input order.
    ///
    /// Dropping the returned future aborts every line task, so no new parser
    /// calls start once the caller stops waiting.
    pub async fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<LineOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut tasks = LineTasks(
            lines
                .iter()
                .map(|line| {
                    let line = line.as_ref().to_string();
                    let pipeline = self.clone();
                    let semaphore = Arc::clone(&semaphore);
                    tokio::spawn(async move {
                        let _permit = semaphore.acquire_owned().await;
                        pipeline.parse_line(&line).await
                    })
                })
                .collect(),
        );

        let mut outcomes = Vec::with_capacity(lines.len());
        for (line, handle) in lines.iter().zip(tasks.0.iter_mut()) {
            let line = line.as_ref();
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(_) if line.trim().is_empty() => LineOutcome::Empty,
                Err(e) => {
                    warn!("Parsing task for '{}' did not complete: {}", line, e);
                    LineOutcome::parse_failure(line, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        debug!(
            "Parsed {} lines with '{}' parser",
            outcomes.len(),
            self.parser_name()
        );
        outcomes
    }

    /// Parse a single line, calling the parser under the configured timeout
    pub async fn parse_line(&self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Empty;
        }

        let normalized = normalize_for_parsing(line);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.parser.parse(&normalized))
                .await
                .unwrap_or(Err(ParserError::Timeout(limit))),
            None => self.parser.parse(&normalized).await,
        };

        self.interpret(line, result)
    }

    /// Decide the outcome of a line from the parser's answer.
    ///
    /// Pure and synchronous; `parse_line` is this plus the parser call.
    pub fn interpret(
        &self,
        original: &str,
        result: Result<ParsedIngredient, ParserError>,
    ) -> LineOutcome {
        if original.trim().is_empty() {
            return LineOutcome::Empty;
        }

        let parsed = match result {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Parser failed for '{}', keeping original text: {}", original, e);
                return LineOutcome::parse_failure(original, e.to_string());
            }
        };

        let Some(name) = parsed.primary_name() else {
            warn!("No ingredient name extracted from '{}', keeping original text", original);
            return LineOutcome::parse_failure(original, "no ingredient name extracted");
        };

        let (quantity, unit) = extract_amount(&parsed);
        let confidence = sanitize_confidence(name.confidence);

        // Checked against the parser's own name, before any normalization
        let check = self.safety.check_misparse(original, &name.text);
        if check.should_fallback {
            info!("Dietary protection for '{}': {}", original, check.reason);
            return LineOutcome::Fallback {
                ingredient: StructuredIngredient::fallback(original, quantity, unit, confidence),
                reason: FallbackReason::SafetyOverride(check.reason),
            };
        }

        if confidence < self.confidence_threshold {
            debug!(
                "Low confidence {:.3} for '{}', keeping original text",
                confidence, original
            );
            return LineOutcome::Fallback {
                ingredient: StructuredIngredient::fallback(original, quantity, unit, confidence),
                reason: FallbackReason::LowConfidence {
                    confidence,
                    threshold: self.confidence_threshold,
                },
            };
        }

        let raw_ingredient = match self.normalizer.normalize(&name.text) {
            None => {
                debug!("Dropped '{}' (ignored ingredient)", original);
                return LineOutcome::Dropped {
                    name: name.text.clone(),
                };
            }
            Some(raw) if raw.is_empty() => {
                return LineOutcome::parse_failure(original, "ingredient name is empty after cleanup");
            }
            Some(raw) => raw,
        };

        let ingredient = StructuredIngredient {
            raw_ingredient,
            quantity,
            unit,
            descriptors: extract_descriptors(&parsed),
            original_text: original.to_string(),
            confidence,
            used_fallback: false,
        };
        debug!(
            "Parsed '{}' as '{}' (confidence {:.3})",
            original, ingredient.raw_ingredient, confidence
        );
        LineOutcome::Parsed(ingredient)
    }
}

/// Spawned line tasks, aborted when dropped
struct LineTasks(Vec<JoinHandle<LineOutcome>>);

impl Drop for LineTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl Default for IngredientPipeline {
    fn default() -> Self {
        IngredientPipeline::new(
            Arc::new(RuleBasedParser::new()),
            DietaryRules::default(),
            NameNormalizer::default(),
        )
    }
}

impl fmt::Debug for IngredientPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngredientPipeline")
            .field("parser", &self.parser.parser_name())
            .field("rules", &self.safety.rules().len())
            .field("confidence_threshold", &self.confidence_threshold)
            .field("timeout", &self.timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

fn extract_amount(parsed: &ParsedIngredient) -> (Option<String>, Option<String>) {
    let Some(amount) = parsed.primary_amount() else {
        return (None, None);
    };

    let quantity = amount
        .quantity
        .as_ref()
        .map(|q| q.to_string())
        .filter(|q| !q.trim().is_empty())
        .map(|q| to_display_fraction(q.trim()));
    let unit = amount
        .unit
        .as_ref()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    (quantity, unit)
}

fn sanitize_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Preparation words first, then comment words; single characters dropped
fn extract_descriptors(parsed: &ParsedIngredient) -> Vec<String> {
    parsed
        .preparation
        .iter()
        .chain(parsed.comment.iter())
        .flat_map(|segment| descriptor_tokens(&segment.text))
        .collect()
}

fn descriptor_tokens(text: &str) -> Vec<String> {
    text.replace(&['(', ')', ','][..], "")
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .map(str::to_string)
        .collect()
}
