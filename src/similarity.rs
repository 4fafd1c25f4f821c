use std::hash::Hash;

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::config::{Hyperparameters, WeightTier};
use crate::normalize::{normalize_with, NormalizeOptions};
use crate::round2;
use crate::tokenize::tokenize;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Four similarity signals and their weighted combination, as percentages
/// rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub overall: f64,
    pub sequence: f64,
    pub normalized: f64,
    pub line_based: f64,
    pub token_based: f64,
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// `2·M / T` where `M` is the number of elements in the matching blocks of
/// a minimal diff and `T` is the combined length of both sequences.
///
/// A minimal Myers diff matches exactly a longest common subsequence, so
/// the ratio does not depend on argument order. Worst case O(n·m). Two
/// empty sequences are identical and score 1.0.
pub fn sequence_ratio<T: Eq + Hash + Ord>(a: &[T], b: &[T]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = capture_diff_slices(Algorithm::Myers, a, b)
        .iter()
        .map(|op| match op {
            DiffOp::Equal { len, .. } => *len,
            _ => 0,
        })
        .sum();
    2.0 * matched as f64 / total as f64
}

pub fn char_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    sequence_ratio(&a, &b)
}

/// Trimmed, non-blank lines in order.
pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Sequence ratio with each trimmed, non-blank line as one unit.
pub fn line_ratio(a: &str, b: &str) -> f64 {
    sequence_ratio(&non_blank_lines(a), &non_blank_lines(b))
}

/// The weight tier used when comparing `a` and `b`.
///
/// Chosen by the larger non-blank line count of the two. When neither text
/// has a token the cosine carries no signal, so the tier for zero lines is
/// used with its token weight spread over the other three.
pub fn weights_for(a: &str, b: &str, hp: &Hyperparameters) -> WeightTier {
    let token_free = tokenize(a).is_empty() && tokenize(b).is_empty();
    tier_for(a, b, token_free, hp)
}

fn tier_for(a: &str, b: &str, token_free: bool, hp: &Hyperparameters) -> WeightTier {
    if token_free {
        return hp.weights.for_line_count(0).without_token();
    }
    let lines = non_blank_lines(a).len().max(non_blank_lines(b).len());
    hp.weights.for_line_count(lines)
}

fn percent(ratio: f64) -> f64 {
    round2(ratio.clamp(0.0, 1.0) * 100.0)
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

pub(crate) fn compute(a: &str, b: &str, hp: &Hyperparameters) -> SimilarityReport {
    let options = NormalizeOptions {
        flatten_brackets: hp.flatten_brackets,
    };

    let sequence = percent(char_ratio(a, b));
    let normalized = percent(char_ratio(
        &normalize_with(a, &options),
        &normalize_with(b, &options),
    ));
    let line_based = percent(line_ratio(a, b));
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let token_based = percent(tokens_a.cosine(&tokens_b));

    // Combine the rounded figures so `overall` can be recomputed from the
    // report alone.
    let tier = tier_for(a, b, tokens_a.is_empty() && tokens_b.is_empty(), hp);
    let overall = round2(tier.combine(sequence, normalized, line_based, token_based))
        .clamp(0.0, 100.0);

    tracing::debug!(
        sequence,
        normalized,
        line_based,
        token_based,
        overall,
        max_lines = ?tier.max_lines,
        "computed similarity"
    );

    SimilarityReport {
        overall,
        sequence,
        normalized,
        line_based,
        token_based,
    }
}
