use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

/// Unicode vulgar fractions and their plain-text equivalents
pub const UNICODE_FRACTIONS: [(char, &str); 15] = [
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅕', "1/5"),
    ('⅖', "2/5"),
    ('⅗', "3/5"),
    ('⅘', "4/5"),
    ('⅙', "1/6"),
    ('⅚', "5/6"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
];

/// Largest denominator kept when a decimal is turned into a fraction
pub const MAX_DENOMINATOR: i128 = 1_000_000;

// Digits beyond these are either dropped (fraction) or rejected (integer) so
// that the continued fraction search stays inside i128.
const MAX_DECIMAL_PLACES: usize = 12;
const MAX_INTEGER_DIGITS: usize = 12;

lazy_static! {
    static ref HYPHENATED_FRACTION: Regex =
        Regex::new(r"(\d+/\d+)-").expect("hyphenated fraction pattern is valid");
}

fn plain_fraction(glyph: char) -> Option<&'static str> {
    UNICODE_FRACTIONS
        .iter()
        .find(|(g, _)| *g == glyph)
        .map(|(_, plain)| *plain)
}

fn glyph_for(numer: i64, denom: i64) -> Option<char> {
    let plain = format!("{}/{}", numer, denom);
    UNICODE_FRACTIONS
        .iter()
        .find(|(_, p)| *p == plain)
        .map(|(g, _)| *g)
}

/// Replace unicode fractions with plain text so a parser can read them.
///
/// A digit directly followed by a glyph becomes a mixed number ("2⅓" turns
/// into "2 1/3"), and hyphenated sizes such as "1/2-inch" lose the hyphen.
pub fn normalize_for_parsing(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len() + 8);

    for ch in text.chars() {
        match plain_fraction(ch) {
            Some(plain) => {
                if normalized.ends_with(|c: char| c.is_ascii_digit()) {
                    normalized.push(' ');
                }
                normalized.push_str(plain);
            }
            None => normalized.push(ch),
        }
    }

    HYPHENATED_FRACTION
        .replace_all(&normalized, "${1} ")
        .into_owned()
}

/// Render a quantity for display: reduced, mixed when improper, with a
/// unicode glyph for the fractional part when one exists.
///
/// Anything that does not parse as a number is handed back unchanged.
pub fn to_display_fraction(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    match Rational::parse(&normalize_for_parsing(text)) {
        Some(value) => value.to_display(),
        None => text.to_string(),
    }
}

/// Add two quantity strings.
///
/// A missing or blank side is treated as zero. When either side is not
/// numeric the result is the literal "a + b" instead of an error.
pub fn combine_quantities(first: Option<&str>, second: Option<&str>) -> Option<String> {
    let first = first.filter(|q| !q.trim().is_empty());
    let second = second.filter(|q| !q.trim().is_empty());

    match (first, second) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (Some(a), Some(b)) => {
            Some(sum_quantities(a, b).unwrap_or_else(|| format!("{} + {}", a, b)))
        }
    }
}

fn sum_quantities(a: &str, b: &str) -> Option<String> {
    let a = Rational::parse(&normalize_for_parsing(a))?;
    let b = Rational::parse(&normalize_for_parsing(b))?;
    Some(a.checked_add(b)?.to_display())
}

/// An exact, always-reduced fraction with a positive denominator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    numer: i64,
    denom: i64,
}

impl Rational {
    /// Build a reduced fraction; `None` for a zero denominator
    pub fn new(numer: i64, denom: i64) -> Option<Self> {
        Self::from_i128(numer as i128, denom as i128)
    }

    pub fn from_integer(value: i64) -> Self {
        Rational {
            numer: value,
            denom: 1,
        }
    }

    pub fn numer(&self) -> i64 {
        self.numer
    }

    pub fn denom(&self) -> i64 {
        self.denom
    }

    pub fn is_integer(&self) -> bool {
        self.denom == 1
    }

    fn from_i128(numer: i128, denom: i128) -> Option<Self> {
        if denom == 0 {
            return None;
        }
        let sign = if denom < 0 { -1 } else { 1 };
        let divisor = gcd(numer, denom).max(1);
        let numer = i64::try_from(sign * numer / divisor).ok()?;
        let denom = i64::try_from(sign * denom / divisor).ok()?;
        Some(Rational { numer, denom })
    }

    /// Exact sum, `None` on overflow
    pub fn checked_add(self, other: Rational) -> Option<Rational> {
        let numer = self.numer as i128 * other.denom as i128 + other.numer as i128 * self.denom as i128;
        let denom = self.denom as i128 * other.denom as i128;
        Self::from_i128(numer, denom)
    }

    /// Parse "3", "1/2", "1.5" or a mixed number like "2 1/3".
    ///
    /// Expects plain text; run [`normalize_for_parsing`] first for unicode input.
    pub fn parse(text: &str) -> Option<Rational> {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        match tokens.as_slice() {
            [single] => parse_simple(single),
            [whole, fraction] => {
                let whole = parse_unsigned(whole)?;
                let (numer, denom) = fraction.split_once('/')?;
                let fraction = Rational::new(parse_unsigned(numer)?, parse_unsigned(denom)?)?;
                if fraction.numer >= fraction.denom {
                    return None;
                }
                Rational::from_integer(whole).checked_add(fraction)
            }
            _ => None,
        }
    }

    /// Display form used for quantities, e.g. "¾", "1 ½", "2 5/7" or "3"
    pub fn to_display(&self) -> String {
        if self.is_integer() {
            return self.numer.to_string();
        }

        if self.numer > self.denom {
            let whole = self.numer / self.denom;
            let remainder = Rational {
                numer: self.numer % self.denom,
                denom: self.denom,
            };
            return format!("{} {}", whole, remainder.fraction_text());
        }

        self.fraction_text()
    }

    fn fraction_text(&self) -> String {
        match glyph_for(self.numer, self.denom) {
            Some(glyph) => glyph.to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

fn parse_unsigned(token: &str) -> Option<i64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_simple(token: &str) -> Option<Rational> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let value = if let Some((numer, denom)) = digits.split_once('/') {
        Rational::new(parse_unsigned(numer)?, parse_unsigned(denom)?)?
    } else if digits.contains('.') {
        parse_decimal(digits)?
    } else {
        Rational::from_integer(parse_unsigned(digits)?)
    };

    if negative {
        Rational::new(value.numer.checked_neg()?, value.denom)
    } else {
        Some(value)
    }
}

fn parse_decimal(token: &str) -> Option<Rational> {
    let (int_part, frac_part) = token.split_once('.')?;
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if int_part.len() > MAX_INTEGER_DIGITS
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let frac_part = &frac_part[..frac_part.len().min(MAX_DECIMAL_PLACES)];
    let scale = 10i128.pow(frac_part.len() as u32);
    let whole: i128 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
    let fraction: i128 = if frac_part.is_empty() { 0 } else { frac_part.parse().ok()? };

    let numer = whole * scale + fraction;
    let divisor = gcd(numer, scale).max(1);
    let (numer, denom) = limit_denominator(numer / divisor, scale / divisor, MAX_DENOMINATOR);
    Rational::from_i128(numer, denom)
}

/// Closest fraction to `numer/denom` whose denominator is at most `max`.
///
/// Continued fraction walk over a reduced, non-negative input.
fn limit_denominator(numer: i128, denom: i128, max: i128) -> (i128, i128) {
    if denom <= max {
        return (numer, denom);
    }

    let (mut p0, mut q0, mut p1, mut q1) = (0i128, 1i128, 1i128, 0i128);
    let (mut n, mut d) = (numer, denom);
    loop {
        if d == 0 {
            return (p1, q1);
        }
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > max {
            break;
        }
        let p2 = p0 + a * p1;
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;
        let rest = n - a * d;
        n = d;
        d = rest;
    }

    let k = (max - q0) / q1;
    let (lower_n, lower_d) = (p0 + k * p1, q0 + k * q1);
    let (upper_n, upper_d) = (p1, q1);

    // |upper - x| <= |lower - x|, cross-multiplied over the common denominator
    let upper_err = (upper_n * denom - numer * upper_d).abs() * lower_d;
    let lower_err = (lower_n * denom - numer * lower_d).abs() * upper_d;
    if upper_err <= lower_err {
        (upper_n, upper_d)
    } else {
        (lower_n, lower_d)
    }
}

fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
