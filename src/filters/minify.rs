//! Whitespace and comment stripping for stylesheets.

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use super::{Filter, FilterContext};

/// Removes `/* */` comments and collapses insignificant whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinFilter;

struct MinifyPatterns {
  comments: Regex,
  whitespace: Regex,
  punctuation: Regex,
  trailing_semicolon: Regex,
}

fn patterns() -> &'static MinifyPatterns {
  static PATTERNS: OnceLock<MinifyPatterns> = OnceLock::new();
  PATTERNS.get_or_init(|| MinifyPatterns {
    comments: Regex::new(r"(?s)/\*.*?\*/").expect("invalid comment regex"),
    whitespace: Regex::new(r"\s+").expect("invalid whitespace regex"),
    punctuation: Regex::new(r"\s*([{};,>])\s*").expect("invalid punctuation regex"),
    trailing_semicolon: Regex::new(r";}").expect("invalid semicolon regex"),
  })
}

impl Filter for CssMinFilter {
  fn apply(&self, content: &str, _context: &FilterContext<'_>) -> Result<String> {
    let patterns = patterns();
    let text = patterns.comments.replace_all(content, "");
    let text = patterns.whitespace.replace_all(&text, " ");
    let text = patterns.punctuation.replace_all(&text, "${1}");
    let text = patterns.trailing_semicolon.replace_all(&text, "}");
    Ok(text.trim().to_string())
  }
}
