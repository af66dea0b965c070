//! Error taxonomy shared by every stage of a resolution request.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = AssetError> = std::result::Result<T, E>;

/// Failures raised while resolving, filtering or writing assets.
///
/// Every variant aborts the current request; nothing is retried and no partial output is
/// published to the host.
#[derive(Debug, Error)]
pub enum AssetError {
  /// No manifest file was found in any of the searched directories.
  #[error("unable to load config file \"{file}\" (searched: {})", display_paths(.searched))]
  ConfigMissing {
    /// Manifest file name that was looked up.
    file: String,
    /// Directories that were searched, in order.
    searched: Vec<PathBuf>,
  },

  /// The manifest exists but could not be parsed.
  #[error("failed to parse {}: {message}", .path.display())]
  ConfigParse {
    /// Manifest path.
    path: PathBuf,
    /// Parser diagnostic.
    message: String,
  },

  /// The requested bundle is absent from the bundle definitions of the output type.
  #[error("unknown bundle \"{bundle}\" for output type \"{output}\"")]
  UnknownBundle {
    /// Output type the bundle was looked up under.
    output: String,
    /// Requested bundle name.
    bundle: String,
  },

  /// A bare identifier does not map to an existing source file.
  #[error("unknown asset \"{identifier}\"")]
  UnknownAsset {
    /// Identifier as requested.
    identifier: String,
  },

  /// A dependency declaration names a reference that is not declared.
  #[error("unknown reference \"@{reference}\" for output type \"{output}\"")]
  UnknownReference {
    /// Output type of the dependency declaration.
    output: String,
    /// Missing reference name.
    reference: String,
  },

  /// A requested filter is not registered with the filter manager.
  #[error("unknown filter \"{name}\"")]
  UnknownFilter {
    /// Requested filter name.
    name: String,
  },

  /// A filter rejected the content of an asset.
  #[error("filter \"{filter}\" failed on \"{asset}\": {message}")]
  FilterFailure {
    /// Source path of the leaf being filtered.
    asset: String,
    /// Filter name.
    filter: String,
    /// Filter diagnostic.
    message: String,
  },

  /// Host parameters violate the tag contract.
  #[error("invalid asset request: {0}")]
  InvalidRequest(String),

  /// Reading a source or writing an artifact failed.
  #[error("i/o failure on {}: {source}", .path.display())]
  Io {
    /// Path involved in the failed operation.
    path: PathBuf,
    /// Underlying error.
    #[source]
    source: std::io::Error,
  },
}

impl AssetError {
  /// Wrap an I/O error with the path it happened on.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

fn display_paths(paths: &[PathBuf]) -> String {
  paths
    .iter()
    .map(|path| path.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}
