//! Source reading seam used by the resolver.

use std::fs;
use std::path::Path;

use crate::error::{AssetError, Result};

/// Reads the raw content of a source file.
pub trait SourceReader {
  /// Returns the full content of the file at `path`.
  fn read(&self, path: &Path) -> Result<String>;
}

/// Reads sources straight from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
  fn read(&self, path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| AssetError::io(path, err))
  }
}
