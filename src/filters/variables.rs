//! Variable resolution for LESS and SCSS sources.
//!
//! Only variable declarations and their uses are compiled; mixins, nesting and functions
//! pass through untouched.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Result, bail};
use regex::{Captures, Regex};

use super::{Filter, FilterContext};

/// At-rules that share the `@` sigil with LESS variables.
const CSS_AT_RULES: &[&str] = &[
  "charset",
  "container",
  "counter-style",
  "document",
  "font-face",
  "font-feature-values",
  "import",
  "keyframes",
  "layer",
  "media",
  "namespace",
  "page",
  "property",
  "supports",
  "viewport",
  "-moz-keyframes",
  "-webkit-keyframes",
];

/// Resolves `@name: value;` declarations and substitutes `@name` uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LessVariablesFilter;

/// Resolves `$name: value;` declarations and strips `//` line comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SassVariablesFilter;

impl Filter for LessVariablesFilter {
  fn apply(&self, content: &str, _context: &FilterContext<'_>) -> Result<String> {
    less_syntax().compile(content)
  }
}

impl Filter for SassVariablesFilter {
  fn apply(&self, content: &str, _context: &FilterContext<'_>) -> Result<String> {
    let without_comments = sass_line_comment().replace_all(content, "${1}");
    sass_syntax().compile(&without_comments)
  }
}

struct VariableSyntax {
  sigil: char,
  declaration: Regex,
  usage: Regex,
  passthrough: &'static [&'static str],
}

fn less_syntax() -> &'static VariableSyntax {
  static SYNTAX: OnceLock<VariableSyntax> = OnceLock::new();
  SYNTAX.get_or_init(|| VariableSyntax {
    sigil: '@',
    declaration: Regex::new(r"(?m)^[ \t]*@([A-Za-z_][\w-]*)[ \t]*:[ \t]*([^;\n]+?)[ \t]*;[ \t]*\r?\n?")
      .expect("invalid less declaration regex"),
    usage: Regex::new(r"@(-?[A-Za-z_][\w-]*)").expect("invalid less usage regex"),
    passthrough: CSS_AT_RULES,
  })
}

fn sass_syntax() -> &'static VariableSyntax {
  static SYNTAX: OnceLock<VariableSyntax> = OnceLock::new();
  SYNTAX.get_or_init(|| VariableSyntax {
    sigil: '$',
    declaration: Regex::new(
      r"(?m)^[ \t]*\$([A-Za-z_][\w-]*)[ \t]*:[ \t]*([^;\n]+?)(?:[ \t]*!default)?[ \t]*;[ \t]*\r?\n?",
    )
    .expect("invalid sass declaration regex"),
    usage: Regex::new(r"\$([A-Za-z_][\w-]*)").expect("invalid sass usage regex"),
    passthrough: &[],
  })
}

fn sass_line_comment() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?m)(^|[\s;{}])//[^\n]*").expect("invalid line comment regex"))
}

fn block_comment() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("invalid block comment regex"))
}

impl VariableSyntax {
  fn compile(&self, content: &str) -> Result<String> {
    let mut values: HashMap<String, String> = HashMap::new();
    for caps in self.declaration.captures_iter(content) {
      let value = self.substitute(caps[2].trim(), &values)?;
      values.insert(caps[1].to_string(), value);
    }

    let body = self.declaration.replace_all(content, "");
    let mut compiled = String::with_capacity(body.len());
    let mut last = 0;
    for comment in block_comment().find_iter(&body) {
      compiled.push_str(&self.substitute(&body[last..comment.start()], &values)?);
      compiled.push_str(comment.as_str());
      last = comment.end();
    }
    compiled.push_str(&self.substitute(&body[last..], &values)?);
    Ok(compiled)
  }

  fn substitute(&self, text: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut missing: Option<String> = None;
    let replaced = self.usage.replace_all(text, |caps: &Captures| {
      let name = &caps[1];
      match values.get(name) {
        Some(value) => value.clone(),
        None => {
          if missing.is_none() && !self.passthrough.contains(&name) {
            missing = Some(name.to_string());
          }
          caps[0].to_string()
        }
      }
    });

    match missing {
      Some(name) => bail!("undefined variable {}{}", self.sigil, name),
      None => Ok(replaced.into_owned()),
    }
  }
}
