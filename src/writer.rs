//! Persist artifacts into the distribution directory behind a content cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{AssetError, Result};
use crate::models::{Artifact, WriteOutcome};

/// Directory name, inside the distribution directory, holding cache markers.
pub const CACHE_DIR_NAME: &str = ".cache";

/// Writes artifacts below a distribution directory.
///
/// A marker keyed by target path and content hash is kept per write; an artifact whose
/// marker exists and whose target file is still present is not rewritten.
#[derive(Debug, Clone)]
pub struct AssetWriter {
  dist_path: PathBuf,
  cache_dir: PathBuf,
}

impl AssetWriter {
  /// Create a writer for `dist_path`.
  pub fn new(dist_path: impl Into<PathBuf>) -> Self {
    let dist_path = dist_path.into();
    let cache_dir = dist_path.join(CACHE_DIR_NAME);
    Self {
      dist_path,
      cache_dir,
    }
  }

  /// Distribution directory artifacts are written to.
  pub fn dist_path(&self) -> &Path {
    &self.dist_path
  }

  /// Write one artifact unless the cache proves the target is current.
  pub fn write_artifact(&self, artifact: &Artifact) -> Result<WriteOutcome> {
    let target = self.dist_path.join(&artifact.target_path);
    let marker = self.cache_dir.join(cache_key(artifact));

    if marker.is_file() && target.is_file() {
      debug!(path = %target.display(), "artifact unchanged, skipping write");
      return Ok(WriteOutcome::Cached);
    }

    guard_sources(&target, &artifact.sources)?;

    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).map_err(|err| AssetError::io(parent, err))?;
    }
    fs::write(&target, &artifact.content).map_err(|err| AssetError::io(&target, err))?;

    fs::create_dir_all(&self.cache_dir).map_err(|err| AssetError::io(&self.cache_dir, err))?;
    fs::write(&marker, artifact.target_path.as_bytes())
      .map_err(|err| AssetError::io(&marker, err))?;

    info!(path = %target.display(), bytes = artifact.content.len(), "wrote artifact");
    Ok(WriteOutcome::Written)
  }
}

/// Refuse to overwrite a file that is one of the artifact's own sources.
fn guard_sources(target: &Path, sources: &[PathBuf]) -> Result<()> {
  if !target.exists() {
    return Ok(());
  }

  for source in sources {
    match is_same_file(source, target) {
      Ok(true) => {
        return Err(AssetError::io(
          target,
          std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("refusing to overwrite source {}", source.display()),
          ),
        ));
      }
      Ok(false) => {}
      Err(err) if err.kind() == ErrorKind::NotFound => {}
      Err(err) => return Err(AssetError::io(source, err)),
    }
  }
  Ok(())
}

fn cache_key(artifact: &Artifact) -> String {
  let mut hasher = Sha256::new();
  hasher.update(artifact.target_path.as_bytes());
  hasher.update([0u8]);
  hasher.update(artifact.content.as_bytes());
  format!("{:x}", hasher.finalize())
}
