use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::ParserError;
use crate::fraction::normalize_for_parsing;
use crate::parsers::{IngredientParser, NameSegment, ParsedAmount, ParsedIngredient, TextSegment};

lazy_static! {
    static ref LEADING_QUANTITY: Regex = Regex::new(
        r"^\s*(?P<qty>\d+(?:\s+|-)\d+/\d+|\d+/\d+|\d*\.\d+|\d+)(?:\s*(?:-|–|to)\s*(?:\d+(?:\s+|-)\d+/\d+|\d+/\d+|\d*\.\d+|\d+))?\s*"
    )
    .expect("leading quantity pattern is valid");
    static ref PARENTHETICAL: Regex =
        Regex::new(r"\(([^)]*)\)").expect("parenthetical pattern is valid");
    static ref TRAILING_COMMENT: Regex = Regex::new(
        r"(?i)\s+(to taste|as needed|for (?:garnish|serving|dusting|frying)|optional)\s*$"
    )
    .expect("trailing comment pattern is valid");
}

/// Spelling → canonical unit
const UNITS: &[(&str, &str)] = &[
    ("cup", "cup"),
    ("cups", "cup"),
    ("c", "cup"),
    ("tablespoon", "tablespoon"),
    ("tablespoons", "tablespoon"),
    ("tbsp", "tablespoon"),
    ("tbsps", "tablespoon"),
    ("tbs", "tablespoon"),
    ("tbl", "tablespoon"),
    ("teaspoon", "teaspoon"),
    ("teaspoons", "teaspoon"),
    ("tsp", "teaspoon"),
    ("tsps", "teaspoon"),
    ("ounce", "ounce"),
    ("ounces", "ounce"),
    ("oz", "ounce"),
    ("pound", "pound"),
    ("pounds", "pound"),
    ("lb", "pound"),
    ("lbs", "pound"),
    ("gram", "gram"),
    ("grams", "gram"),
    ("g", "gram"),
    ("kilogram", "kilogram"),
    ("kilograms", "kilogram"),
    ("kg", "kilogram"),
    ("milliliter", "milliliter"),
    ("milliliters", "milliliter"),
    ("millilitre", "milliliter"),
    ("millilitres", "milliliter"),
    ("ml", "milliliter"),
    ("liter", "liter"),
    ("liters", "liter"),
    ("litre", "liter"),
    ("litres", "liter"),
    ("l", "liter"),
    ("pint", "pint"),
    ("pints", "pint"),
    ("quart", "quart"),
    ("quarts", "quart"),
    ("qt", "quart"),
    ("gallon", "gallon"),
    ("gallons", "gallon"),
    ("pinch", "pinch"),
    ("pinches", "pinch"),
    ("dash", "dash"),
    ("dashes", "dash"),
    ("clove", "clove"),
    ("cloves", "clove"),
    ("can", "can"),
    ("cans", "can"),
    ("package", "package"),
    ("packages", "package"),
    ("pkg", "package"),
    ("stick", "stick"),
    ("sticks", "stick"),
    ("slice", "slice"),
    ("slices", "slice"),
    ("bunch", "bunch"),
    ("bunches", "bunch"),
    ("sprig", "sprig"),
    ("sprigs", "sprig"),
    ("head", "head"),
    ("heads", "head"),
    ("piece", "piece"),
    ("pieces", "piece"),
    ("inch", "inch"),
    ("inches", "inch"),
];

const SIZE_WORDS: &[&str] = &["small", "medium", "large", "extra-large", "jumbo"];

const PREPARATION_WORDS: &[&str] = &[
    "diced", "chopped", "minced", "sliced", "grated", "shredded", "crushed", "peeled", "cubed",
    "melted", "softened", "beaten", "divided", "drained", "rinsed", "julienned", "halved",
    "quartered", "toasted", "ground", "trimmed", "seeded", "cored", "zested", "juiced", "mashed",
    "thinly", "finely", "roughly", "coarsely", "freshly", "cut",
];

const BASE_CONFIDENCE: f64 = 0.95;

fn canonical_unit(word: &str) -> Option<&'static str> {
    let word = word.trim_end_matches('.').to_lowercase();
    UNITS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, unit)| *unit)
}

fn is_preparation(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .map(|word| {
            let word = word
                .trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase();
            PREPARATION_WORDS.contains(&word.as_str()) || (word.len() > 3 && word.ends_with("ed"))
        })
        .unwrap_or(false)
}

/// Offline, regex driven ingredient parser.
///
/// Reads a leading quantity (ranges keep the lower bound), a unit from a fixed
/// table, size words, a comma-separated preparation or comment tail, and
/// parenthesized comments. Confidence drops for names that look ambiguous.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    pub fn new() -> Self {
        RuleBasedParser
    }

    pub fn parse_line(&self, text: &str) -> ParsedIngredient {
        let text = normalize_for_parsing(text.trim());

        let mut comments: Vec<String> = PARENTHETICAL
            .captures_iter(&text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let text = PARENTHETICAL.replace_all(&text, " ");

        let (quantity, rest) = match LEADING_QUANTITY.captures(&text) {
            Some(caps) => {
                let end = caps.get(0).map_or(0, |m| m.end());
                // "1-1/2" is a mixed number
                let quantity = caps.name("qty").map(|m| m.as_str().replace('-', " "));
                // "2-inch piece": the hyphen belongs to neither quantity nor name
                let rest = text[end..].strip_prefix('-').unwrap_or(&text[end..]);
                (quantity, rest)
            }
            None => (None, &text[..]),
        };

        let (unit, rest) = split_unit(rest, quantity.is_some());

        let (name_part, tail) = match rest.split_once(',') {
            Some((name, tail)) => (name.to_string(), tail.trim().to_string()),
            None => (rest, String::new()),
        };

        let mut preparation: Vec<String> = Vec::new();
        let name_part = match TRAILING_COMMENT.captures(&name_part) {
            Some(caps) => {
                comments.push(caps[1].to_lowercase());
                TRAILING_COMMENT.replace(&name_part, "").into_owned()
            }
            None => name_part,
        };

        let mut words: Vec<&str> = name_part.split_whitespace().collect();
        while let Some(first) = words.first() {
            if words.len() > 1 && SIZE_WORDS.contains(&first.to_lowercase().as_str()) {
                preparation.push(first.to_lowercase());
                words.remove(0);
            } else {
                break;
            }
        }

        if !tail.is_empty() {
            if is_preparation(&tail) {
                preparation.push(tail);
            } else {
                comments.push(tail);
            }
        }

        let name = words
            .join(" ")
            .trim_end_matches(|c: char| c == '.' || c == ';' || c == ':')
            .trim()
            .to_string();

        let confidence = estimate_confidence(&name, quantity.is_some() || unit.is_some());
        debug!(
            "Rule parser: '{}' -> quantity={:?} unit={:?} name='{}' confidence={:.2}",
            text, quantity, unit, name, confidence
        );

        ParsedIngredient {
            name: if name.is_empty() {
                Vec::new()
            } else {
                vec![NameSegment::new(name, confidence)]
            },
            amount: if quantity.is_some() || unit.is_some() {
                vec![ParsedAmount::new(quantity.as_deref(), unit)]
            } else {
                Vec::new()
            },
            preparation: (!preparation.is_empty()).then(|| TextSegment::new(preparation.join(", "))),
            comment: (!comments.is_empty()).then(|| TextSegment::new(comments.join(", "))),
        }
    }
}

/// Peel a unit off the front of `rest`.
///
/// Without a quantity a unit is only taken when followed by "of" ("pinch of
/// salt"), so a bare "cloves" stays an ingredient name.
fn split_unit(rest: &str, has_quantity: bool) -> (Option<&'static str>, String) {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let Some(unit) = words.first().and_then(|w| canonical_unit(w)) else {
        return (None, words.join(" "));
    };

    let followed_by_of = words.get(1).map(|w| w.eq_ignore_ascii_case("of")).unwrap_or(false);
    if !has_quantity && !followed_by_of {
        return (None, words.join(" "));
    }

    let skip = if followed_by_of { 2 } else { 1 };
    if words.len() <= skip {
        return (None, words.join(" "));
    }

    (Some(unit), words[skip..].join(" "))
}

fn estimate_confidence(name: &str, has_amount: bool) -> f64 {
    let words: Vec<&str> = name.split_whitespace().collect();

    if name.chars().any(|c| c.is_ascii_digit()) {
        return 0.5;
    }
    if words.iter().any(|w| w.eq_ignore_ascii_case("or")) {
        return 0.55;
    }
    if words.len() > 6 {
        return 0.4;
    }
    if words.len() > 4 {
        return 0.7;
    }
    if has_amount {
        BASE_CONFIDENCE
    } else {
        0.85
    }
}

#[async_trait]
impl IngredientParser for RuleBasedParser {
    fn parser_name(&self) -> &str {
        "rules"
    }

    async fn parse(&self, text: &str) -> Result<ParsedIngredient, ParserError> {
        Ok(self.parse_line(text))
    }
}
