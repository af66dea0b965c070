//! Rewrite relative stylesheet URLs for the artifact's new location.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use regex::{Captures, Regex};
use tracing::warn;

use super::{Filter, FilterContext};
use crate::asset_paths::should_ignore_url_reference;

/// Rewrites relative `url(...)` references so they resolve from the target directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssRewriteFilter;

impl Filter for CssRewriteFilter {
  fn apply(&self, content: &str, context: &FilterContext<'_>) -> Result<String> {
    let source_dir = context.source_path.parent().unwrap_or(Path::new(""));
    let rewritten = url_pattern().replace_all(content, |caps: &Captures| {
      let quote = &caps[1];
      let reference = caps[2].trim();
      if should_ignore_url_reference(reference) {
        return caps[0].to_string();
      }

      let (path, suffix) = split_suffix(reference);
      let resolved = source_dir.join(path);
      match relative_path(context.target_dir, &resolved) {
        Some(relative) => format!("url({quote}{relative}{suffix}{quote})"),
        None => {
          warn!(
            path = %resolved.display(),
            target_dir = %context.target_dir.display(),
            "cannot rebase url against the target directory, keeping reference"
          );
          caps[0].to_string()
        }
      }
    });
    Ok(rewritten.into_owned())
  }
}

/// `url(...)` with an optional matching quote in group 1 and the reference in group 2.
pub(super) fn url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"url\(\s*(['"]?)([^'"()]+?)['"]?\s*\)"#).expect("invalid url regex")
  })
}

/// Split a reference into its path and any `?query` or `#fragment` suffix.
pub(super) fn split_suffix(reference: &str) -> (&str, &str) {
  match reference.find(['?', '#']) {
    Some(index) => reference.split_at(index),
    None => (reference, ""),
  }
}

fn normalise(path: &Path) -> PathBuf {
  let mut normalised = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let ends_with_normal =
          matches!(normalised.components().next_back(), Some(Component::Normal(_)));
        if ends_with_normal {
          normalised.pop();
        } else {
          normalised.push("..");
        }
      }
      other => normalised.push(other.as_os_str()),
    }
  }
  normalised
}

/// Lexical path from `from_dir` to `to`, or `None` when one is absolute and the other not
/// or `from_dir` climbs above its own root.
fn relative_path(from_dir: &Path, to: &Path) -> Option<String> {
  let from = normalise(from_dir);
  let to = normalise(to);
  if from.has_root() != to.has_root() {
    return None;
  }

  let from_parts: Vec<Component<'_>> = from.components().collect();
  let to_parts: Vec<Component<'_>> = to.components().collect();
  let common = from_parts
    .iter()
    .zip(&to_parts)
    .take_while(|(left, right)| left == right)
    .count();

  if from_parts[common..].contains(&Component::ParentDir) {
    return None;
  }

  let mut segments: Vec<String> = vec!["..".to_string(); from_parts.len() - common];
  segments.extend(
    to_parts[common..]
      .iter()
      .map(|part| part.as_os_str().to_string_lossy().to_string()),
  );
  Some(segments.join("/"))
}
