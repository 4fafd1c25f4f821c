use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use codesim_guard::{
    compare_files, compute_similarity, detect_ai_likelihood, Analyzer, CodesimError, Confidence,
    Hyperparameters, Indicator, Sample, SourceFile,
};

const COMMENTED_PY: &str = "\
# Compute running statistics over a list of numbers.
def mean(values):
    # Guard against empty input.
    if not values:
        return 0.0
    # Sum everything, then divide.
    total = sum(values)
    return total / len(values)


def variance(values):
    # Population variance.
    m = mean(values)
    squared = [(v - m) ** 2 for v in values]
    return mean(squared)


def summary(values):
    # Bundle both numbers together.
    return {\"mean\": mean(values), \"variance\": variance(values)}
";

const COMPACT_PY: &str = "\
def total(values):
    acc = 0
    for v in values:
        acc += v
    return acc

def largest(values):
    best = values[0]
    for v in values:
        if v > best:
            best = v
    return best
";

// Same program as COMPACT_PY with `values` renamed and tab-heavy spacing.
const SPREAD_PY: &str = "def total(items):\n\
\t\tacc\t=\t0\n\
\n\
\n\
\t\tfor v in items:\n\
\t\t\t\tacc\t+=\tv\n\
\n\
\n\
\t\treturn acc\n\
\n\
\n\
\n\
def largest(items):\n\
\t\tbest\t=\titems[0]\n\
\n\
\n\
\t\tfor v in items:\n\
\t\t\t\tif v > best:\n\
\t\t\t\t\t\tbest\t=\tv\n\
\n\
\n\
\t\treturn best\n";

const DOC_HEAVY_PY: &str = "\
\"\"\"Helpers for data handling.\"\"\"


def load_data(data):
    \"\"\"Load the data.\"\"\"
    # Copy the input data.
    result = data
    # Return the result.
    return result


def save_data(data):
    \"\"\"Save the data.\"\"\"
    # Store the value.
    value = data
    # Return the value.
    return value


def show_data(data):
    \"\"\"Show the data.\"\"\"
    # Print the item.
    print(data)
";

#[test]
fn identical_commented_snippets_score_full_marks() {
    assert_eq!(COMMENTED_PY.lines().count(), 20);
    let result = compute_similarity(COMMENTED_PY, COMMENTED_PY);
    assert!(
        result.overall >= 95.0,
        "Identical snippets should score >= 95, got {}",
        result.overall
    );
    assert_eq!(result.overall, 100.0);
    assert_eq!(result.sequence, 100.0);
    assert_eq!(result.normalized, 100.0);
    assert_eq!(result.line_based, 100.0);
    assert_eq!(result.token_based, 100.0);
}

#[test]
fn normalization_recovers_reformatted_code() {
    let result = compute_similarity(COMPACT_PY, SPREAD_PY);
    assert!(
        result.normalized > result.sequence + 15.0,
        "normalized {} should clearly beat sequence {}",
        result.normalized,
        result.sequence
    );
    assert!(result.overall < 100.0);
}

#[test]
fn similarity_is_symmetric() {
    let ab = compute_similarity(COMPACT_PY, SPREAD_PY);
    let ba = compute_similarity(SPREAD_PY, COMPACT_PY);
    assert_eq!(ab, ba);

    let ab = compute_similarity(COMMENTED_PY, DOC_HEAVY_PY);
    let ba = compute_similarity(DOC_HEAVY_PY, COMMENTED_PY);
    assert_eq!(ab.overall, ba.overall);
}

#[test]
fn empty_texts_are_identical() {
    let result = compute_similarity("", "");
    assert_eq!(result.overall, 100.0);
    assert_eq!(result.sequence, 100.0);
    assert_eq!(result.line_based, 100.0);
    assert_eq!(result.token_based, 0.0);
}

#[test]
fn empty_against_code_scores_zero() {
    let result = compute_similarity("", "x = 1");
    assert_eq!(result.overall, 0.0);
    assert_eq!(result.token_based, 0.0);
}

#[test]
fn token_similarity_uses_proportions() {
    let result = compute_similarity("a a b", "a a a a b b");
    assert_eq!(result.token_based, 100.0);
    assert_eq!(result.sequence, 62.5);
    assert_eq!(result.line_based, 0.0);
}

#[test]
fn reordered_lines_keep_full_token_score() {
    let result = compute_similarity("x = 1\ny = 2\n", "y = 2\nx = 1\n");
    assert_eq!(result.token_based, 100.0);
    assert_eq!(result.line_based, 50.0);
    assert_eq!(result.overall, 69.09);
}

#[test]
fn flattening_brackets_changes_only_normalized_score() {
    let hp = Hyperparameters {
        flatten_brackets: true,
        ..Hyperparameters::default()
    };
    let analyzer = Analyzer::new(hp).unwrap();
    let a = "call(a, b)\n";
    let b = "call a, b\n";
    let plain = compute_similarity(a, b);
    let flat = analyzer.compute_similarity(a, b);
    assert_eq!(flat.normalized, 100.0);
    assert!(plain.normalized < 100.0);
    assert_eq!(flat.sequence, plain.sequence);
    assert_eq!(flat.token_based, plain.token_based);
}

#[test]
fn empty_input_detection_is_zero() {
    let result = detect_ai_likelihood("");
    assert_eq!(result.probability, 0.0);
    assert_eq!(result.confidence, Confidence::Low);
    assert_eq!(result.indicators.len(), 5);
    assert!(result.indicators.values().all(|v| *v == 0.0));

    let blank = detect_ai_likelihood("\n   \n\t\n");
    assert_eq!(blank, result);
}

#[test]
fn commented_code_reads_as_low() {
    let result = detect_ai_likelihood(COMMENTED_PY);
    assert_eq!(result.indicators["comment_density"], 31.25);
    assert_eq!(result.indicators["perfect_indentation"], 80.0);
    assert_eq!(result.indicators["complexity"], 70.0);
    assert_eq!(result.probability, 36.25);
    assert_eq!(result.confidence, Confidence::Low);
}

#[test]
fn documented_generic_code_reads_as_high() {
    let result = detect_ai_likelihood(DOC_HEAVY_PY);
    assert_eq!(result.indicators["comment_density"], 29.41);
    assert_eq!(result.indicators["generic_names"], 100.0);
    assert_eq!(result.indicators["documentation_style"], 80.0);
    assert_eq!(result.probability, 71.88);
    assert_eq!(result.confidence, Confidence::High);
}

#[test]
fn all_comment_file_is_scored() {
    let result = detect_ai_likelihood("# only a comment\n# another\n");
    assert_eq!(result.indicators["comment_density"], 100.0);
    assert_eq!(result.indicators["perfect_indentation"], 0.0);
    assert_eq!(result.probability, 34.0);
    assert_eq!(result.confidence, Confidence::Low);
}

#[test]
fn detection_is_deterministic() {
    assert_eq!(
        detect_ai_likelihood(DOC_HEAVY_PY),
        detect_ai_likelihood(DOC_HEAVY_PY)
    );
}

struct Fixed(f64);

impl Indicator for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn score(&self, _: &Sample<'_>) -> f64 {
        self.0
    }
}

fn banded(score: f64) -> Confidence {
    let analyzer =
        Analyzer::with_indicators(Hyperparameters::default(), vec![Box::new(Fixed(score))])
            .unwrap();
    let report = analyzer.detect_ai_likelihood("x = 1");
    assert_eq!(report.probability, score);
    report.confidence
}

#[test]
fn confidence_bands_at_boundaries() {
    assert_eq!(banded(0.0), Confidence::Low);
    assert_eq!(banded(40.0), Confidence::Low);
    assert_eq!(banded(40.01), Confidence::Medium);
    assert_eq!(banded(70.0), Confidence::Medium);
    assert_eq!(banded(70.01), Confidence::High);
    assert_eq!(banded(100.0), Confidence::High);
}

#[test]
fn custom_naming_multiplier_applies() {
    let hp = Hyperparameters {
        generic_name_multiplier: 8.0,
        ..Hyperparameters::default()
    };
    let analyzer = Analyzer::new(hp).unwrap();
    let result = analyzer.detect_ai_likelihood("data = temp + value\n");
    assert_eq!(result.indicators["generic_names"], 24.0);
}

#[test]
fn short_naming_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("naming.toml");
    fs::write(&config, "naming = \"short\"\nshort_name_multiplier = 25.0\n").unwrap();

    let analyzer = Analyzer::new(Hyperparameters::from_file(&config).unwrap()).unwrap();
    let result = analyzer.detect_ai_likelihood("a1 = b2 + c3\nresult = a1\n");
    assert_eq!(result.indicators.len(), 5);
    assert_eq!(result.indicators["short_names"], 100.0);
    assert_eq!(result.indicators.get("generic_names"), None);
}

#[test]
fn custom_indicators_need_unique_names() {
    let err = Analyzer::with_indicators(
        Hyperparameters::default(),
        vec![Box::new(Fixed(10.0)), Box::new(Fixed(20.0))],
    )
    .err()
    .unwrap();
    assert!(matches!(err, CodesimError::Config(_)));
}

#[test]
fn compare_files_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.py");
    let second = dir.path().join("second.py");
    fs::write(&first, COMPACT_PY).unwrap();
    fs::write(&second, SPREAD_PY).unwrap();

    let report = compare_files(&first, &second).unwrap();
    assert!(report.success);
    assert_eq!(report.language, "Python");
    assert_eq!(report.extension, "py");
    assert_eq!(report.similarity, compute_similarity(COMPACT_PY, SPREAD_PY));
    assert_eq!(report.ai_detection.file1, detect_ai_likelihood(COMPACT_PY));

    let json = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["success"], true);
    assert!(parsed["similarity"].get("overall").is_some());
    assert!(parsed["similarity"].get("line_based").is_some());
    assert!(parsed["ai_detection"]["file1"].get("probability").is_some());
    assert_eq!(parsed["ai_detection"]["file2"]["confidence"], "low");
}

#[test]
fn compare_files_rejects_mismatched_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.js");
    let second = dir.path().join("b.ts");
    fs::write(&first, "let x = 1;").unwrap();
    fs::write(&second, "let x: number = 1;").unwrap();

    let err = compare_files(&first, &second).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(err, CodesimError::MismatchedExtensions { .. }));
}

#[test]
fn compare_files_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("a.go");
    fs::write(&present, "package main").unwrap();

    let err = compare_files(&present, &dir.path().join("gone.go")).unwrap_err();
    assert!(matches!(err, CodesimError::MissingFile(_)));
    assert!(err.is_validation());
}

#[test]
fn invalid_utf8_is_dropped_not_rejected() {
    let hp = Hyperparameters::default();
    let source = SourceFile::from_bytes("main.c", b"int x\xff = 1;", &hp).unwrap();
    assert_eq!(source.text, "int x = 1;");
    assert_eq!(source.language, "C");
}

fn run_cli(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_codesim-guard"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn cli_detect_reads_invalid_utf8_from_stdin() {
    let output = run_cli(&["detect", "--compact"], b"x = 1\n\xff\ny = 2\n");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let expected = detect_ai_likelihood("x = 1\n\ny = 2\n");
    assert_eq!(parsed["probability"].as_f64(), Some(expected.probability));
    assert_eq!(parsed["confidence"], expected.confidence.to_string());
}

#[test]
fn cli_detect_rejects_oversized_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("limits.toml");
    fs::write(&config, "max_file_bytes = 4\n").unwrap();

    let output = run_cli(
        &["detect", "--config", config.to_str().unwrap()],
        b"abcdefgh",
    );
    assert_eq!(output.status.code(), Some(2));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["error"].as_str().unwrap().contains("<stdin>"));
}
