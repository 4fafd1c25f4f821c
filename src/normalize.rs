//! Comment and whitespace stripping ahead of similarity comparison.
//!
//! The patterns below stand in for a lexer. They do not know about string
//! literals, so a `#` or `//` inside a string (a URL, a shell snippet) is
//! treated as the start of a comment and the rest of that line is dropped.
//! Both sides of a comparison are normalized the same way, so the damage is
//! symmetric.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(?://|#).*$").unwrap());

static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static TRIPLE_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)""".*?"""|'''.*?'''"#).unwrap());

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}()\[\]]").unwrap());

// A line break plus any blank lines and indentation around it.
static LINE_BREAK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*(?:\r?\n[ \t]*)+").unwrap());

static HORIZONTAL_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Replace `{ } ( ) [ ]` with spaces.
    pub flatten_brackets: bool,
}

/// Normalize with default options (brackets kept).
pub fn normalize(text: &str) -> String {
    normalize_with(text, &NormalizeOptions::default())
}

pub fn normalize_with(text: &str, options: &NormalizeOptions) -> String {
    let code = LINE_COMMENT_RE.replace_all(text, "");
    let code = BLOCK_COMMENT_RE.replace_all(&code, "");
    let code = TRIPLE_QUOTE_RE.replace_all(&code, "");
    let code = if options.flatten_brackets {
        BRACKET_RE.replace_all(&code, " ").into_owned()
    } else {
        code.into_owned()
    };
    let code = LINE_BREAK_RUN_RE.replace_all(&code, "\n");
    let code = HORIZONTAL_SPACE_RE.replace_all(&code, " ");
    code.trim().to_string()
}
