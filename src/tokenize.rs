use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Identifiers and keywords, digit runs, or any single symbol.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}_]\w*|\d+|[^\s\w]").unwrap());

/// Relative token frequencies of one text.
///
/// Entries sum to 1.0 against the token count of the text they came from.
/// A text without tokens yields an empty vector. Keys are kept sorted so
/// that sums over the vector are accumulated in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TokenFrequencyVector(BTreeMap<String, f64>);

impl TokenFrequencyVector {
    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn norm(&self) -> f64 {
        self.0.values().map(|f| f * f).sum::<f64>().sqrt()
    }

    /// Cosine of the angle between two frequency vectors, in [0, 1].
    ///
    /// Zero when either side is empty.
    pub fn cosine(&self, other: &TokenFrequencyVector) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        // Only shared keys contribute to the dot product. Iterating the
        // smaller map keeps the sorted order, so the sum is symmetric.
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .0
            .iter()
            .filter_map(|(token, f)| large.0.get(token).map(|g| f * g))
            .sum();
        let denom = self.norm() * other.norm();
        if denom == 0.0 {
            return 0.0;
        }
        (dot / denom).clamp(0.0, 1.0)
    }
}

pub fn tokenize(text: &str) -> TokenFrequencyVector {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for m in TOKEN_RE.find_iter(text) {
        *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return TokenFrequencyVector::default();
    }
    let total = total as f64;
    TokenFrequencyVector(
        counts
            .into_iter()
            .map(|(token, count)| (token, count as f64 / total))
            .collect(),
    )
}
