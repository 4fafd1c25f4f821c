//! Heuristic estimate of how machine-generated a source file looks.
//!
//! Each indicator maps structural features of the text to a score in
//! [0, 100]. The detector runs an ordered list of indicators and reports
//! their unweighted mean. None of this is calibrated against labelled data;
//! treat the probability as a rough signal, not a classification.

use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{Hyperparameters, NamingVariant};
use crate::error::{CodesimError, CodesimResult};
use crate::round2;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// `high` above `confidence_high_above`, `medium` above
    /// `confidence_medium_above`, `low` otherwise. Both bounds are exclusive.
    pub fn from_probability(probability: f64, hp: &Hyperparameters) -> Self {
        if probability > hp.confidence_high_above {
            Self::High
        } else if probability > hp.confidence_medium_above {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Indicator name to score in [0, 100], in the order the detector ran
/// them. Serializes as a JSON object with keys in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiIndicatorSet(Vec<(String, f64)>);

impl AiIndicatorSet {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, score)| *score)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &f64> {
        self.0.iter().map(|(_, score)| score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, score)| (name.as_str(), *score))
    }

    fn push(&mut self, name: &str, score: f64) {
        self.0.push((name.to_string(), score));
    }
}

impl Index<&str> for AiIndicatorSet {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        match self.0.iter().find(|(key, _)| key == name) {
            Some((_, score)) => score,
            None => panic!("no indicator named {name:?}"),
        }
    }
}

impl Serialize for AiIndicatorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, score)| (name, score)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiDetectionReport {
    pub probability: f64,
    pub confidence: Confidence,
    pub indicators: AiIndicatorSet,
}

/// The text under analysis together with its non-blank lines.
///
/// Lines keep their indentation; only fully blank lines are dropped.
#[derive(Debug, Clone)]
pub struct Sample<'a> {
    pub text: &'a str,
    pub lines: Vec<&'a str>,
}

impl<'a> Sample<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        Self { text, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// One structural signal. Implementations should return a value in
/// [0, 100]; the detector clamps whatever they return.
pub trait Indicator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Only called with a sample that has at least one non-blank line.
    fn score(&self, sample: &Sample<'_>) -> f64;
}

static GENERIC_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:var|temp|data|result|value|item|element|obj|arr)\d*\b").unwrap()
});

static SHORT_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z]{1,2}\d+\b").unwrap());

static DOC_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)""".*?"""|'''.*?'''|/\*\*.*?\*/"#).unwrap());

const COMMENT_MARKERS: [&str; 4] = ["#", "//", "/*", "*"];

/// Share of non-blank lines that start with a comment marker.
pub struct CommentDensity;

impl Indicator for CommentDensity {
    fn name(&self) -> &'static str {
        "comment_density"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let comments = sample
            .lines
            .iter()
            .filter(|line| {
                let trimmed = line.trim_start();
                COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m))
            })
            .count();
        round2(comments as f64 / sample.lines.len() as f64 * 100.0)
    }
}

/// Placeholder identifiers such as `data`, `temp2` or `result`.
pub struct GenericNames {
    pub multiplier: f64,
}

impl Indicator for GenericNames {
    fn name(&self) -> &'static str {
        "generic_names"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let count = GENERIC_NAME_RE.find_iter(sample.text).count();
        (count as f64 * self.multiplier).min(100.0)
    }
}

/// Terse identifiers made of one or two letters and a number, like `x1` or
/// `ab42`. Replaces [`GenericNames`] when `naming = "short"`.
pub struct ShortNames {
    pub multiplier: f64,
}

impl Indicator for ShortNames {
    fn name(&self) -> &'static str {
        "short_names"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let count = SHORT_NAME_RE.find_iter(sample.text).count();
        (count as f64 * self.multiplier).min(100.0)
    }
}

/// Few distinct indentation widths reads as uniformly formatted code.
pub struct IndentationConsistency {
    pub max_distinct: usize,
    pub consistent_score: f64,
    pub varied_score: f64,
}

impl Indicator for IndentationConsistency {
    fn name(&self) -> &'static str {
        "perfect_indentation"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let widths: HashSet<usize> = sample
            .lines
            .iter()
            .filter(|line| line.starts_with([' ', '\t']))
            .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
            .collect();
        if widths.is_empty() {
            0.0
        } else if widths.len() <= self.max_distinct {
            self.consistent_score
        } else {
            self.varied_score
        }
    }
}

/// Docstrings and `/** */` blocks.
pub struct DocumentationStyle {
    pub multiplier: f64,
}

impl Indicator for DocumentationStyle {
    fn name(&self) -> &'static str {
        "documentation_style"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let blocks = DOC_BLOCK_RE.find_iter(sample.text).count();
        (blocks as f64 * self.multiplier).min(100.0)
    }
}

/// Shorter average lines score higher.
pub struct LineLengthComplexity {
    pub short_max: f64,
    pub medium_max: f64,
    pub short_score: f64,
    pub medium_score: f64,
    pub long_score: f64,
}

impl Indicator for LineLengthComplexity {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn score(&self, sample: &Sample<'_>) -> f64 {
        let chars: usize = sample.lines.iter().map(|line| line.chars().count()).sum();
        let avg = chars as f64 / sample.lines.len() as f64;
        if avg < self.short_max {
            self.short_score
        } else if avg < self.medium_max {
            self.medium_score
        } else {
            self.long_score
        }
    }
}

/// The five indicators reported by default, in reporting order. The
/// naming slot follows `hp.naming`.
pub fn default_indicators(hp: &Hyperparameters) -> Vec<Box<dyn Indicator>> {
    let naming: Box<dyn Indicator> = match hp.naming {
        NamingVariant::Generic => Box::new(GenericNames {
            multiplier: hp.generic_name_multiplier,
        }),
        NamingVariant::Short => Box::new(ShortNames {
            multiplier: hp.short_name_multiplier,
        }),
    };
    vec![
        Box::new(CommentDensity),
        naming,
        Box::new(IndentationConsistency {
            max_distinct: hp.indentation_max_distinct,
            consistent_score: hp.indentation_consistent_score,
            varied_score: hp.indentation_varied_score,
        }),
        Box::new(DocumentationStyle {
            multiplier: hp.doc_block_multiplier,
        }),
        Box::new(LineLengthComplexity {
            short_max: hp.line_length_short_max,
            medium_max: hp.line_length_medium_max,
            short_score: hp.complexity_short_score,
            medium_score: hp.complexity_medium_score,
            long_score: hp.complexity_long_score,
        }),
    ]
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub struct Detector {
    indicators: Vec<Box<dyn Indicator>>,
    hp: Hyperparameters,
}

impl Detector {
    pub fn new(hp: &Hyperparameters) -> Self {
        Self {
            indicators: default_indicators(hp),
            hp: hp.clone(),
        }
    }

    /// Fails when two indicators share a name, since the report is keyed by
    /// name.
    pub fn with_indicators(
        indicators: Vec<Box<dyn Indicator>>,
        hp: &Hyperparameters,
    ) -> CodesimResult<Self> {
        let mut seen = HashSet::new();
        for indicator in &indicators {
            if !seen.insert(indicator.name()) {
                return Err(CodesimError::Config(format!(
                    "duplicate indicator name '{}'",
                    indicator.name()
                )));
            }
        }
        Ok(Self {
            indicators,
            hp: hp.clone(),
        })
    }

    pub fn indicator_names(&self) -> Vec<&'static str> {
        self.indicators.iter().map(|i| i.name()).collect()
    }

    pub fn detect(&self, text: &str) -> AiDetectionReport {
        let sample = Sample::new(text);

        if sample.is_empty() || self.indicators.is_empty() {
            let mut indicators = AiIndicatorSet::default();
            for indicator in &self.indicators {
                indicators.push(indicator.name(), 0.0);
            }
            return AiDetectionReport {
                probability: 0.0,
                confidence: Confidence::Low,
                indicators,
            };
        }

        let mut indicators = AiIndicatorSet::default();
        let mut total = 0.0;
        for indicator in &self.indicators {
            let raw = indicator.score(&sample);
            let score = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) };
            tracing::debug!(indicator = indicator.name(), score, "scored indicator");
            total += score;
            indicators.push(indicator.name(), score);
        }

        let probability = round2(total / (self.indicators.len() as f64 * 100.0) * 100.0);
        let confidence = Confidence::from_probability(probability, &self.hp);

        AiDetectionReport {
            probability,
            confidence,
            indicators,
        }
    }
}
