use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodesimError, CodesimResult};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Similarity weighting
// ---------------------------------------------------------------------------

/// One row of the weighting step function.
///
/// A tier applies to comparisons whose larger side has at most `max_lines`
/// non-blank lines. The last tier leaves `max_lines` unset and covers
/// everything above the previous threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,
    pub sequence: f64,
    pub normalized: f64,
    pub line: f64,
    pub token: f64,
}

impl WeightTier {
    pub fn sum(&self) -> f64 {
        self.sequence + self.normalized + self.line + self.token
    }

    /// Weighted combination of four scores given in the same order as the
    /// weights.
    pub fn combine(&self, sequence: f64, normalized: f64, line: f64, token: f64) -> f64 {
        sequence * self.sequence
            + normalized * self.normalized
            + line * self.line
            + token * self.token
    }

    /// The same tier with the token weight moved onto the other three in
    /// proportion, or split evenly when they are all zero.
    pub fn without_token(&self) -> WeightTier {
        if self.token == 0.0 {
            return *self;
        }
        let rest = self.sequence + self.normalized + self.line;
        if rest == 0.0 {
            let third = 1.0 / 3.0;
            return WeightTier {
                max_lines: self.max_lines,
                sequence: third,
                normalized: third,
                line: third,
                token: 0.0,
            };
        }
        WeightTier {
            max_lines: self.max_lines,
            sequence: self.sequence / rest,
            normalized: self.normalized / rest,
            line: self.line / rest,
            token: 0.0,
        }
    }

    fn covers(&self, line_count: usize) -> bool {
        self.max_lines.map_or(true, |max| line_count <= max)
    }
}

/// Line-count driven weighting for the four similarity signals.
///
/// Line-level matching says more when there is more structure to compare,
/// so the line weight grows with document size while the token weight
/// shrinks. The zero-line tier also serves comparisons where neither text
/// has a token, with its token weight spread over the other signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPolicy {
    pub tiers: Vec<WeightTier>,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                WeightTier {
                    max_lines: Some(0),
                    sequence: 0.40,
                    normalized: 0.40,
                    line: 0.20,
                    token: 0.00,
                },
                WeightTier {
                    max_lines: Some(50),
                    sequence: 0.30,
                    normalized: 0.30,
                    line: 0.20,
                    token: 0.20,
                },
                WeightTier {
                    max_lines: Some(200),
                    sequence: 0.30,
                    normalized: 0.30,
                    line: 0.25,
                    token: 0.15,
                },
                WeightTier {
                    max_lines: None,
                    sequence: 0.30,
                    normalized: 0.30,
                    line: 0.30,
                    token: 0.10,
                },
            ],
        }
    }
}

impl WeightPolicy {
    /// Tier for a comparison whose larger side has `line_count` non-blank
    /// lines. Falls back to the last tier, which `validate` guarantees is
    /// unbounded.
    pub fn for_line_count(&self, line_count: usize) -> WeightTier {
        self.tiers
            .iter()
            .find(|tier| tier.covers(line_count))
            .or_else(|| self.tiers.last())
            .copied()
            .unwrap_or(WeightTier {
                max_lines: None,
                sequence: 0.25,
                normalized: 0.25,
                line: 0.25,
                token: 0.25,
            })
    }

    pub fn validate(&self) -> CodesimResult<()> {
        let Some(last) = self.tiers.last() else {
            return Err(CodesimError::Config(
                "weights.tiers must contain at least one tier".into(),
            ));
        };
        if last.max_lines.is_some() {
            return Err(CodesimError::Config(
                "the last weight tier must not set max_lines".into(),
            ));
        }

        let mut prev_max: Option<usize> = None;
        let mut prev_line = f64::NEG_INFINITY;
        for (i, tier) in self.tiers.iter().enumerate() {
            let weights = [tier.sequence, tier.normalized, tier.line, tier.token];
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(CodesimError::Config(format!(
                    "weight tier {i} has a negative or non-finite weight"
                )));
            }
            if (tier.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(CodesimError::Config(format!(
                    "weight tier {i} sums to {}, expected 1.0",
                    tier.sum()
                )));
            }
            if tier.line < prev_line {
                return Err(CodesimError::Config(format!(
                    "weight tier {i} lowers the line weight ({} < {prev_line})",
                    tier.line
                )));
            }
            if i + 1 < self.tiers.len() {
                let Some(max) = tier.max_lines else {
                    return Err(CodesimError::Config(format!(
                        "weight tier {i} is unbounded but is not the last tier"
                    )));
                };
                if prev_max.is_some_and(|p| max <= p) {
                    return Err(CodesimError::Config(format!(
                        "weight tier {i} threshold {max} does not ascend"
                    )));
                }
                prev_max = Some(max);
            }
            prev_line = tier.line;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

/// Which naming indicator the default detector runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingVariant {
    /// Placeholder words like `data`, `temp2` or `result`, reported as
    /// `generic_names` and scaled by `generic_name_multiplier`.
    #[default]
    Generic,
    /// Letter-digit identifiers like `x1`, reported as `short_names` and
    /// scaled by `short_name_multiplier`.
    Short,
}

/// Every tunable constant used by the analyzer and the file boundary.
///
/// The detector constants are empirical. They are kept as named fields so a
/// config file can override them without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Replace `{}()[]` with spaces during normalization. Trades structural
    /// signal for pure content comparison.
    pub flatten_brackets: bool,
    pub weights: WeightPolicy,

    pub naming: NamingVariant,
    pub generic_name_multiplier: f64,
    pub short_name_multiplier: f64,
    pub indentation_max_distinct: usize,
    pub indentation_consistent_score: f64,
    pub indentation_varied_score: f64,
    pub doc_block_multiplier: f64,
    pub line_length_short_max: f64,
    pub line_length_medium_max: f64,
    pub complexity_short_score: f64,
    pub complexity_medium_score: f64,
    pub complexity_long_score: f64,
    pub confidence_high_above: f64,
    pub confidence_medium_above: f64,

    pub max_file_bytes: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            flatten_brackets: false,
            weights: WeightPolicy::default(),
            naming: NamingVariant::Generic,
            generic_name_multiplier: 10.0,
            short_name_multiplier: 10.0,
            indentation_max_distinct: 3,
            indentation_consistent_score: 80.0,
            indentation_varied_score: 30.0,
            doc_block_multiplier: 20.0,
            line_length_short_max: 30.0,
            line_length_medium_max: 50.0,
            complexity_short_score: 70.0,
            complexity_medium_score: 50.0,
            complexity_long_score: 30.0,
            confidence_high_above: 70.0,
            confidence_medium_above: 40.0,
            max_file_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Hyperparameters {
    pub fn from_toml_str(content: &str) -> CodesimResult<Self> {
        let hp: Self = toml::from_str(content)?;
        hp.validate()?;
        Ok(hp)
    }

    pub fn from_file(path: &Path) -> CodesimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let hp = Self::from_toml_str(&content)?;
        tracing::info!("Loaded hyperparameters from {}", path.display());
        Ok(hp)
    }

    pub fn validate(&self) -> CodesimResult<()> {
        self.weights.validate()?;

        let scores = [
            ("generic_name_multiplier", self.generic_name_multiplier),
            ("short_name_multiplier", self.short_name_multiplier),
            ("indentation_consistent_score", self.indentation_consistent_score),
            ("indentation_varied_score", self.indentation_varied_score),
            ("doc_block_multiplier", self.doc_block_multiplier),
            ("complexity_short_score", self.complexity_short_score),
            ("complexity_medium_score", self.complexity_medium_score),
            ("complexity_long_score", self.complexity_long_score),
        ];
        for (name, value) in scores {
            if !value.is_finite() || value < 0.0 {
                return Err(CodesimError::Config(format!(
                    "{name} must be a nonnegative number, got {value}"
                )));
            }
        }

        if self.line_length_short_max > self.line_length_medium_max {
            return Err(CodesimError::Config(
                "line_length_short_max must not exceed line_length_medium_max".into(),
            ));
        }
        if !(self.complexity_short_score >= self.complexity_medium_score
            && self.complexity_medium_score >= self.complexity_long_score)
        {
            return Err(CodesimError::Config(
                "complexity scores must not increase with line length".into(),
            ));
        }
        if self.confidence_medium_above > self.confidence_high_above {
            return Err(CodesimError::Config(
                "confidence_medium_above must not exceed confidence_high_above".into(),
            ));
        }
        if self.max_file_bytes == 0 {
            return Err(CodesimError::Config("max_file_bytes must be positive".into()));
        }
        Ok(())
    }
}
