//! Inline small stylesheet images as base64 data URIs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose};
use regex::Captures;
use tracing::warn;

use super::rewrite::{split_suffix, url_pattern};
use super::{Filter, FilterContext};
use crate::asset_paths::should_ignore_url_reference;

/// Default size limit for embedded files.
pub const DEFAULT_MAX_EMBED_BYTES: u64 = 32 * 1024;

/// Replaces relative `url(...)` references with `data:` URIs.
///
/// Files that are missing, larger than `max_bytes`, referenced with a `#fragment` or of an
/// unknown media type keep their original reference.
#[derive(Debug, Clone, Copy)]
pub struct CssEmbedFilter {
  /// Largest file, in bytes, that is inlined.
  pub max_bytes: u64,
}

impl Default for CssEmbedFilter {
  fn default() -> Self {
    Self {
      max_bytes: DEFAULT_MAX_EMBED_BYTES,
    }
  }
}

impl Filter for CssEmbedFilter {
  fn apply(&self, content: &str, context: &FilterContext<'_>) -> Result<String> {
    let source_dir = context.source_path.parent().unwrap_or(Path::new(""));
    let mut failure: Option<anyhow::Error> = None;

    let embedded = url_pattern().replace_all(content, |caps: &Captures| {
      let reference = caps[2].trim();
      if failure.is_some() || should_ignore_url_reference(reference) {
        return caps[0].to_string();
      }

      let (path, suffix) = split_suffix(reference);
      if suffix.starts_with('#') {
        return caps[0].to_string();
      }

      match self.data_uri(&source_dir.join(path)) {
        Ok(Some(uri)) => format!("url(\"{uri}\")"),
        Ok(None) => caps[0].to_string(),
        Err(err) => {
          failure = Some(err);
          caps[0].to_string()
        }
      }
    });

    if let Some(err) = failure {
      return Err(err);
    }
    Ok(embedded.into_owned())
  }
}

impl CssEmbedFilter {
  fn data_uri(&self, file: &Path) -> Result<Option<String>> {
    let Some(mime) = media_type(file) else {
      return Ok(None);
    };
    let Ok(metadata) = fs::metadata(file) else {
      warn!(path = %file.display(), "embedded file not found, keeping reference");
      return Ok(None);
    };
    if !metadata.is_file() || metadata.len() > self.max_bytes {
      return Ok(None);
    }

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    if bytes.len() as u64 > self.max_bytes {
      bail!("{} grew past the embed limit while reading", file.display());
    }
    Ok(Some(format!(
      "data:{mime};base64,{}",
      general_purpose::STANDARD.encode(bytes)
    )))
  }
}

fn media_type(file: &Path) -> Option<&'static str> {
  let extension = file.extension()?.to_str()?.to_ascii_lowercase();
  let mime = match extension.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "webp" => "image/webp",
    "woff" => "font/woff",
    "woff2" => "font/woff2",
    _ => return None,
  };
  Some(mime)
}
