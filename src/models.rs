//! Data structures produced while resolving and compiling a request.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Marker distinguishing a reference token from a bare source path.
pub const REFERENCE_MARKER: char = '@';

/// Entry of an expanded identifier list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetId {
  /// Bare source path, relative to the application directory.
  Path(String),
  /// Named reference declared in the dependency declarations.
  Reference(String),
}

impl AssetId {
  /// Classify a raw identifier; `@name` is a reference, anything else a path.
  pub fn parse(raw: &str) -> Self {
    match raw.strip_prefix(REFERENCE_MARKER) {
      Some(name) => Self::Reference(name.to_string()),
      None => Self::Path(raw.to_string()),
    }
  }

  /// Reference token for a reference name.
  pub fn reference(name: impl Into<String>) -> Self {
    Self::Reference(name.into())
  }
}

impl fmt::Display for AssetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Path(path) => f.write_str(path),
      Self::Reference(name) => write!(f, "{REFERENCE_MARKER}{name}"),
    }
  }
}

/// How a request is published to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
  /// One combined artifact per request.
  #[default]
  Production,
  /// One artifact per leaf asset, emitted in dependency order.
  Debug,
}

impl OutputMode {
  /// Mode matching the host's debug flag.
  pub fn from_debug(debug: bool) -> Self {
    if debug { Self::Debug } else { Self::Production }
  }

  /// Returns true in debug mode.
  pub fn is_debug(self) -> bool {
    self == Self::Debug
  }
}

/// A requested filter; `?name` marks a filter skipped in debug mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
  /// Registered filter name.
  pub name: String,
  /// Only applied in production mode.
  pub optional: bool,
}

impl FilterSpec {
  /// Parse a single filter name.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    match raw.strip_prefix('?') {
      Some(name) => Self {
        name: name.trim().to_string(),
        optional: true,
      },
      None => Self {
        name: raw.to_string(),
        optional: false,
      },
    }
  }

  /// Whether the filter runs in the given mode.
  pub fn applies_in(&self, mode: OutputMode) -> bool {
    !(self.optional && mode.is_debug())
  }
}

/// Filtered, ready-to-write output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Cache-busted path relative to the distribution directory.
  pub target_path: String,
  /// Filtered content.
  pub content: String,
  /// Leaf source files the content was built from, in order.
  pub sources: Vec<PathBuf>,
}

/// Outcome of persisting a single artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
  /// Content was written to the target path.
  Written,
  /// The content cache already held this content for the target path.
  Cached,
}

/// Serializable summary of an artifact written by a request.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
  /// Public URL of the artifact.
  pub url: String,
  /// Whether the artifact was written or served from cache.
  pub outcome: WriteOutcome,
  /// Leaf source files the artifact covers.
  pub sources: Vec<PathBuf>,
}
