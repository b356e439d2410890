use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How much a misparse would hurt downstream dietary tagging.
///
/// Recorded on the verdict only; every firing rule forces a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Medium,
}

/// A known parser failure mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryRule {
    /// Phrases that, when present in the original line, arm the rule
    pub original_contains: Vec<String>,
    /// Parsed names (exact or as a suffix) that are wrong for those lines
    pub parsed_matches: Vec<String>,
    pub reason: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_severity() -> Severity {
    Severity::Critical
}

impl DietaryRule {
    pub fn new(
        original_contains: &[&str],
        parsed_matches: &[&str],
        reason: &str,
        severity: Severity,
    ) -> Self {
        DietaryRule {
            original_contains: original_contains.iter().map(|s| s.to_lowercase()).collect(),
            parsed_matches: parsed_matches.iter().map(|s| s.to_lowercase()).collect(),
            reason: reason.to_string(),
            severity,
        }
    }

    fn lowercased(mut self) -> Self {
        for phrase in self.original_contains.iter_mut().chain(self.parsed_matches.iter_mut()) {
            *phrase = phrase.trim().to_lowercase();
        }
        self
    }

    /// Both arguments must already be lowercased and trimmed
    fn fires(&self, original: &str, parsed: &str) -> bool {
        let original_match = self
            .original_contains
            .iter()
            .any(|phrase| original.contains(phrase.as_str()));

        // Equality or suffix only, so "nutmeg" never trips an "egg" target
        let parsed_match = self
            .parsed_matches
            .iter()
            .any(|target| parsed == target || parsed.ends_with(target.as_str()));

        original_match && parsed_match
    }
}

/// Result of checking one parsed name against the rule table
#[derive(Debug, Clone, PartialEq)]
pub struct MisparseCheck {
    pub should_fallback: bool,
    pub reason: String,
    pub severity: Option<Severity>,
}

impl MisparseCheck {
    fn clear() -> Self {
        MisparseCheck {
            should_fallback: false,
            reason: String::new(),
            severity: None,
        }
    }
}

/// The table of dietary misparse rules
#[derive(Debug, Clone)]
pub struct DietaryRules {
    rules: Vec<DietaryRule>,
}

impl DietaryRules {
    /// An empty table that never fires
    pub fn empty() -> Self {
        DietaryRules { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: DietaryRule) -> Self {
        self.rules.push(rule.lowercased());
        self
    }

    pub fn extend<I: IntoIterator<Item = DietaryRule>>(mut self, rules: I) -> Self {
        self.rules.extend(rules.into_iter().map(DietaryRule::lowercased));
        self
    }

    pub fn rules(&self) -> &[DietaryRule] {
        &self.rules
    }

    /// Check whether `parsed_name` is a known bad reading of `original_text`
    pub fn check_misparse(&self, original_text: &str, parsed_name: &str) -> MisparseCheck {
        let original = original_text.trim().to_lowercase();
        let parsed = parsed_name.trim().to_lowercase();

        match self.rules.iter().find(|rule| rule.fires(&original, &parsed)) {
            Some(rule) => {
                warn!(
                    "Dietary misparse detected for '{}' parsed as '{}': {}",
                    original_text, parsed_name, rule.reason
                );
                MisparseCheck {
                    should_fallback: true,
                    reason: rule.reason.clone(),
                    severity: Some(rule.severity),
                }
            }
            None => {
                debug!("No dietary misparse for '{}' -> '{}'", original_text, parsed_name);
                MisparseCheck::clear()
            }
        }
    }
}

impl Default for DietaryRules {
    fn default() -> Self {
        use Severity::{Critical, Medium};

        DietaryRules::empty()
            .with_rule(DietaryRule::new(
                &["eggplant"],
                &["eggs", "egg"],
                "eggplant incorrectly parsed as eggs (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &[
                    "coconut milk",
                    "almond milk",
                    "oat milk",
                    "soy milk",
                    "rice milk",
                    "cashew milk",
                ],
                &["milk"],
                "plant-based milk incorrectly parsed as dairy milk (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &["almond butter", "peanut butter", "cashew butter", "sunflower butter"],
                &["butter"],
                "nut/seed butter incorrectly parsed as dairy butter (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &["vegan cheese", "cashew cheese", "nutritional yeast"],
                &["cheese"],
                "vegan cheese incorrectly parsed as dairy cheese (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &["coconut cream", "cashew cream"],
                &["cream"],
                "plant-based cream incorrectly parsed as dairy cream (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &["egg replacer", "flax egg", "chia egg"],
                &["eggs", "egg"],
                "egg substitute incorrectly parsed as eggs (vegan vs non-vegan)",
                Critical,
            ))
            .with_rule(DietaryRule::new(
                &["vanilla extract"],
                &["vanilla"],
                "vanilla extract parsed as just vanilla (loses specificity)",
                Medium,
            ))
            .with_rule(DietaryRule::new(
                &["seaweed", "kelp", "nori"],
                &["meat", "beef", "pork", "chicken"],
                "sea vegetable incorrectly parsed as meat (vegan vs non-vegan)",
                Critical,
            ))
    }
}
