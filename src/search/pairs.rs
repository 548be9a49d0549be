//! Term-list splitting and the pair generator.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::Pair;

static MIXED_DELIMITERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,;]+").expect("delimiter pattern is valid"));

/// How a raw term list typed by the user is split into terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterPolicy {
    /// Split on commas only; terms may contain spaces ("breast cancer, TP53").
    Comma,
    /// Split on runs of commas, semicolons and whitespace; every word is a term.
    Mixed,
}

impl DelimiterPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "comma" => Some(DelimiterPolicy::Comma),
            "mixed" => Some(DelimiterPolicy::Mixed),
            _ => None,
        }
    }
}

impl Default for DelimiterPolicy {
    fn default() -> Self {
        DelimiterPolicy::Comma
    }
}

/// Split user input into terms. Terms are trimmed and empty pieces dropped;
/// order and duplicates are preserved.
pub fn parse_terms(input: &str, policy: DelimiterPolicy) -> Vec<String> {
    let pieces: Vec<&str> = match policy {
        DelimiterPolicy::Comma => input.split(',').collect(),
        DelimiterPolicy::Mixed => MIXED_DELIMITERS.split(input).collect(),
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Cartesian product, outer loop over `first`, inner loop over `second`.
pub fn generate_pairs<S: AsRef<str>>(first: &[S], second: &[S]) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(first.len() * second.len());
    for x in first {
        for y in second {
            pairs.push(Pair::new(x.as_ref(), y.as_ref()));
        }
    }
    pairs
}
