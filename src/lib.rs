//! Compare two source files and estimate how machine-generated each looks.
//!
//! Similarity blends four text-surface signals: raw character matching,
//! matching after comments and whitespace are stripped, line matching, and
//! token-frequency cosine. The AI-likelihood score is the mean of a few
//! structural indicators. Neither is a plagiarism or clone detector; both
//! are heuristics over surface features.

pub mod config;
pub mod detect;
pub mod error;
pub mod normalize;
pub mod similarity;
pub mod source;
pub mod tokenize;

use std::path::Path;

use once_cell::sync::Lazy;
use serde::Serialize;

pub use config::{Hyperparameters, NamingVariant, WeightPolicy, WeightTier};
pub use detect::{AiDetectionReport, AiIndicatorSet, Confidence, Detector, Indicator, Sample};
pub use error::{CodesimError, CodesimResult};
pub use normalize::{normalize, normalize_with, NormalizeOptions};
pub use similarity::SimilarityReport;
pub use source::SourceFile;
pub use tokenize::{tokenize, TokenFrequencyVector};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct FileDetections {
    pub file1: AiDetectionReport,
    pub file2: AiDetectionReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub success: bool,
    pub language: String,
    pub extension: String,
    pub similarity: SimilarityReport,
    pub ai_detection: FileDetections,
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Similarity and AI-likelihood analysis under one set of hyperparameters.
///
/// Holds no per-call state, so one analyzer can serve many threads.
pub struct Analyzer {
    hp: Hyperparameters,
    detector: Detector,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::build(Hyperparameters::default())
    }
}

impl Analyzer {
    pub fn new(hp: Hyperparameters) -> CodesimResult<Self> {
        hp.validate()?;
        Ok(Self::build(hp))
    }

    /// Use a custom indicator list instead of the default five. Indicator
    /// names must be unique.
    pub fn with_indicators(
        hp: Hyperparameters,
        indicators: Vec<Box<dyn Indicator>>,
    ) -> CodesimResult<Self> {
        hp.validate()?;
        let detector = Detector::with_indicators(indicators, &hp)?;
        Ok(Self { hp, detector })
    }

    fn build(hp: Hyperparameters) -> Self {
        let detector = Detector::new(&hp);
        Self { hp, detector }
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hp
    }

    pub fn compute_similarity(&self, text_a: &str, text_b: &str) -> SimilarityReport {
        similarity::compute(text_a, text_b, &self.hp)
    }

    pub fn detect_ai_likelihood(&self, text: &str) -> AiDetectionReport {
        self.detector.detect(text)
    }

    /// Analyze two files that already passed intake. Fails only when their
    /// extensions differ.
    pub fn compare_sources(
        &self,
        first: &SourceFile,
        second: &SourceFile,
    ) -> CodesimResult<ComparisonReport> {
        source::check_pair(first, second)?;
        tracing::info!("Comparing {} and {}", first.filename, second.filename);

        Ok(ComparisonReport {
            success: true,
            language: first.language.to_string(),
            extension: first.extension.clone(),
            similarity: self.compute_similarity(&first.text, &second.text),
            ai_detection: FileDetections {
                file1: self.detect_ai_likelihood(&first.text),
                file2: self.detect_ai_likelihood(&second.text),
            },
        })
    }

    /// Read, validate and compare two files from disk.
    pub fn compare_files(&self, first: &Path, second: &Path) -> CodesimResult<ComparisonReport> {
        let first = SourceFile::read(first, &self.hp)?;
        let second = SourceFile::read(second, &self.hp)?;
        self.compare_sources(&first, &second)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

static DEFAULT_ANALYZER: Lazy<Analyzer> = Lazy::new(Analyzer::default);

/// Compare two texts with the default hyperparameters.
///
/// `compute_similarity("", "")` has overall 100: empty texts are identical.
pub fn compute_similarity(text_a: &str, text_b: &str) -> SimilarityReport {
    DEFAULT_ANALYZER.compute_similarity(text_a, text_b)
}

/// Score one text with the default indicators. Text without a non-blank
/// line scores 0 with `low` confidence.
pub fn detect_ai_likelihood(text: &str) -> AiDetectionReport {
    DEFAULT_ANALYZER.detect_ai_likelihood(text)
}

pub fn compare_sources(first: &SourceFile, second: &SourceFile) -> CodesimResult<ComparisonReport> {
    DEFAULT_ANALYZER.compare_sources(first, second)
}

pub fn compare_files(first: &Path, second: &Path) -> CodesimResult<ComparisonReport> {
    DEFAULT_ANALYZER.compare_files(first, second)
}
