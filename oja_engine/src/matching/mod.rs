//! The fuzzy catalog matcher.
//!
//! Free-text cart lines arrive from a chat relay ("2kg ric", "Add rice", "3x beans") and must be
//! reconciled against catalog names. Scoring is a cascade of cheap short-circuits before the
//! blended metric:
//!
//! 1. Exact match after normalization → 1.0
//! 2. Containment of the shorter string (≥ 3 chars, ≥ 50% of the longer) → 0.95
//! 3. A shared word of length ≥ 3 → 0.9
//! 4. A weighted blend of normalized Levenshtein, Jaro-Winkler and word overlap.
//!
//! The acceptance threshold and blend weights were inherited from the original bot tuning with no
//! documented derivation, so they are configuration ([`MatchConfig`]), not constants.
pub mod metrics;

use std::sync::OnceLock;

use log::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;
pub const DEFAULT_WEIGHT_LEVENSHTEIN: f64 = 0.4;
pub const DEFAULT_WEIGHT_JARO: f64 = 0.4;
pub const DEFAULT_WEIGHT_WORDS: f64 = 0.2;

const CONTAINMENT_SCORE: f64 = 0.95;
const SHARED_WORD_SCORE: f64 = 0.9;
const MIN_FRAGMENT_LEN: usize = 3;

//--------------------------------------    MatchConfig      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Best score below this is reported as no match.
    pub threshold: f64,
    pub weight_levenshtein: f64,
    pub weight_jaro: f64,
    pub weight_words: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            weight_levenshtein: DEFAULT_WEIGHT_LEVENSHTEIN,
            weight_jaro: DEFAULT_WEIGHT_JARO,
            weight_words: DEFAULT_WEIGHT_WORDS,
        }
    }
}

impl MatchConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        Self {
            threshold: env_f64("OJA_MATCH_THRESHOLD", defaults.threshold),
            weight_levenshtein: env_f64("OJA_MATCH_WEIGHT_LEVENSHTEIN", defaults.weight_levenshtein),
            weight_jaro: env_f64("OJA_MATCH_WEIGHT_JARO", defaults.weight_jaro),
            weight_words: env_f64("OJA_MATCH_WEIGHT_WORDS", defaults.weight_words),
        }
    }
}

fn env_f64(var: &str, default: f64) -> f64 {
    match std::env::var(var) {
        Ok(s) => s.parse::<f64>().unwrap_or_else(|e| {
            warn!("🛒️ {s} is not a valid value for {var}. {e}. Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//--------------------------------------    Normalization    ---------------------------------------------------------
/// Lowercases, strips punctuation and collapses inner whitespace. All scoring happens on
/// normalized strings.
pub fn normalize(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a measurement-scale label, so that "1 Paint", "1paint" and "paint" all
/// compare equal. A leading "1" before a unit word is dropped; "5kg" and "10kg" keep theirs.
pub fn scale_key(s: &str) -> String {
    let collapsed: String = s.to_lowercase().split_whitespace().collect();
    match collapsed.strip_prefix('1') {
        Some(rest) if rest.starts_with(|c: char| c.is_alphabetic()) => rest.to_string(),
        _ => collapsed,
    }
}

//--------------------------------------      CartLine       ---------------------------------------------------------
/// A parsed free-text cart line: the product query with any quantity multiplier and measurement
/// scale stripped off.
///
/// `"2x 1kg rice"` → quantity 2, scale `"1kg"`, query `"rice"`. A bare leading integer also
/// counts as a quantity (`"2 rice"`), while `"2kg ric"` is a scale, not a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub query: String,
    pub quantity: i64,
    pub scale: Option<String>,
}

// "kg" must come before "g" and "ml" before "l", or the shorter unit wins the alternation.
const SCALE_UNITS: &str = "kg|g|litres?|liters?|ml|l|paints?|bags?|tubers?|cups?|pcs|pieces?|bunch(?:es)?|crates?|cartons?|sachets?";

fn cart_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"^(?:(?P<qty>\d+)\s*x\s+)?(?:(?P<scale>\d+(?:\.\d+)?\s*(?:{SCALE_UNITS}))(?:\s+(?:of\s+)?|$))?(?P<rest>.*?)(?:\s+(?P<trailing_scale>\d+(?:\.\d+)?\s*(?:{SCALE_UNITS})))?$"
        );
        Regex::new(&pattern).expect("cart line regex is valid")
    })
}

impl CartLine {
    /// Parses a raw cart line. The query may come out empty ("2kg" on its own); callers treat
    /// that as malformed input.
    pub fn parse(text: &str) -> Self {
        let normalized = normalize(text);
        let caps = match cart_line_regex().captures(&normalized) {
            Some(caps) => caps,
            None => return Self { query: normalized, quantity: 1, scale: None },
        };
        let mut quantity = caps.name("qty").and_then(|m| m.as_str().parse::<i64>().ok()).unwrap_or(1).max(1);
        let scale = caps
            .name("scale")
            .or_else(|| caps.name("trailing_scale"))
            .map(|m| m.as_str().split_whitespace().collect::<String>());
        let mut query = caps.name("rest").map(|m| m.as_str().to_string()).unwrap_or_default();
        // "2 rice" with no unit: the leading integer is a quantity.
        if quantity == 1 && scale.is_none() {
            if let Some((first, rest)) = query.split_once(' ') {
                if let Ok(n) = first.parse::<i64>() {
                    if n > 0 {
                        quantity = n;
                        query = rest.to_string();
                    }
                }
            }
        }
        Self { query, quantity, scale }
    }
}

//--------------------------------------      Scoring        ---------------------------------------------------------
/// Scores a normalized query against a normalized candidate name. Both sides must already have
/// been through [`normalize`].
pub fn similarity(query: &str, candidate: &str, config: &MatchConfig) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 1.0;
    }
    let (shorter, longer) = if query.chars().count() <= candidate.chars().count() {
        (query, candidate)
    } else {
        (candidate, query)
    };
    let shorter_len = shorter.chars().count();
    let longer_len = longer.chars().count();
    if shorter_len >= MIN_FRAGMENT_LEN && longer.contains(shorter) && shorter_len * 2 >= longer_len {
        return CONTAINMENT_SCORE;
    }
    if shares_word(query, candidate) {
        return SHARED_WORD_SCORE;
    }
    config.weight_levenshtein * metrics::levenshtein_similarity(query, candidate)
        + config.weight_jaro * metrics::jaro_winkler(query, candidate)
        + config.weight_words * metrics::word_overlap(query, candidate)
}

fn shares_word(a: &str, b: &str) -> bool {
    a.split_whitespace()
        .filter(|w| w.chars().count() >= MIN_FRAGMENT_LEN)
        .any(|w| b.split_whitespace().any(|other| other == w))
}

/// Scores `query` against every name of a candidate (custom display name and base name) and keeps
/// the best.
pub fn best_name_score<'a, I: IntoIterator<Item = &'a str>>(query: &str, names: I, config: &MatchConfig) -> f64 {
    names.into_iter().map(|name| similarity(query, &normalize(name), config)).fold(0.0, f64::max)
}

#[cfg(test)]
mod test {
    use super::*;

    fn score(query: &str, candidate: &str) -> f64 {
        similarity(&normalize(query), &normalize(candidate), &MatchConfig::default())
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(score("rice", "Rice"), 1.0);
        assert_eq!(score("  Fresh   Fish ", "fresh fish"), 1.0);
    }

    #[test]
    fn disjoint_strings_stay_below_threshold() {
        let config = MatchConfig::default();
        for (a, b) in [("yam", "rice"), ("garri", "stockfish"), ("milk", "pepper")] {
            let s = score(a, b);
            assert!(s < config.threshold, "{a} vs {b} scored {s}");
        }
    }

    #[test]
    fn containment_awards_095() {
        // "rice" occupies exactly 50% of "add rice": the boundary is inclusive.
        assert_eq!(score("Add rice", "rice"), 0.95);
        assert_eq!(score("ric", "rice"), 0.95);
    }

    #[test]
    fn containment_requires_half_the_longer_string() {
        // "yam" is in "pounded yam flour mix" but is well under 50% of it; the shared-word
        // heuristic catches it instead.
        assert_eq!(score("yam", "pounded yam flour mix"), 0.9);
        // Two-char fragments never trigger containment.
        assert!(score("ug", "ugu") < 0.95);
    }

    #[test]
    fn shared_word_awards_09() {
        assert_eq!(score("fresh catfish whole", "catfish pepper mix"), 0.9);
        // Short shared words ("of", "de") don't count.
        assert!(score("tin of milk", "bag of salt") < 0.9);
    }

    #[test]
    fn blend_catches_typos() {
        let config = MatchConfig::default();
        // Neither containment nor shared-word fires here; the blended metric carries it.
        let s = score("tomatos", "tomatoes");
        assert!((0.7..0.95).contains(&s), "scored {s}");
        assert!(s >= config.threshold);
        // A single-word typo with no shared prefix bonus to speak of falls short: word overlap
        // contributes nothing for unequal single words.
        assert!(score("beens", "beans") < config.threshold);
    }

    #[test]
    fn empty_and_unicode_inputs_never_panic() {
        assert_eq!(score("", "rice"), 0.0);
        assert_eq!(score("rice", ""), 0.0);
        let _ = score("ẹ̀fọ́ rírò", "efo riro");
    }

    #[test]
    fn cart_line_extracts_scale_and_quantity() {
        assert_eq!(
            CartLine::parse("2kg ric"),
            CartLine { query: "ric".into(), quantity: 1, scale: Some("2kg".into()) }
        );
        assert_eq!(
            CartLine::parse("3x 1kg Rice"),
            CartLine { query: "rice".into(), quantity: 3, scale: Some("1kg".into()) }
        );
        assert_eq!(
            CartLine::parse("1 paint of garri"),
            CartLine { query: "garri".into(), quantity: 1, scale: Some("1paint".into()) }
        );
        assert_eq!(CartLine::parse("2 rice"), CartLine { query: "rice".into(), quantity: 2, scale: None });
        assert_eq!(CartLine::parse("Add rice"), CartLine { query: "add rice".into(), quantity: 1, scale: None });
    }

    #[test]
    fn cart_line_trailing_scale() {
        assert_eq!(
            CartLine::parse("Beans 2kg"),
            CartLine { query: "beans".into(), quantity: 1, scale: Some("2kg".into()) }
        );
        assert_eq!(
            CartLine::parse("tomatoes 1 crate"),
            CartLine { query: "tomatoes".into(), quantity: 1, scale: Some("1crate".into()) }
        );
    }

    #[test]
    fn scale_keys_compare_loosely() {
        assert_eq!(scale_key("1 Paint"), "paint");
        assert_eq!(scale_key("1kg"), "kg");
        assert_eq!(scale_key("kg"), "kg");
        assert_eq!(scale_key("5kg"), "5kg");
        assert_eq!(scale_key("10kg"), "10kg");
        assert_eq!(scale_key("2 litres"), "2litres");
    }

    #[test]
    fn cart_line_with_nothing_but_a_scale_is_empty() {
        let line = CartLine::parse("2kg");
        assert!(line.query.is_empty());
    }
}
