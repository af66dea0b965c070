//! Asset manifest loader describing paths, bundles and dependency declarations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{AssetError, Result};
use crate::references::DependencyDeclaration;

/// Manifest file names searched for in every config directory, in priority order.
pub const MANIFEST_FILES: [&str; 3] = ["assets.json", "assets.yaml", "assets.yml"];

/// Bundle definitions of one output type: bundle name to ordered identifiers.
pub type BundleDefinitions = BTreeMap<String, Vec<String>>;

/// Process-wide, read-once description of the asset layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifest {
  /// Web root that published assets live under.
  #[serde(alias = "static_path")]
  pub static_path: PathBuf,
  /// Directory inside the web root receiving artifacts; also the URL prefix.
  #[serde(alias = "assets_path")]
  pub assets_path: String,
  /// Directory bare identifiers are resolved against.
  #[serde(alias = "app_path")]
  pub app_path: PathBuf,
  /// Derived `static_path/assets_path`.
  #[serde(skip)]
  pub dist_path: PathBuf,
  /// Output type to named bundles.
  #[serde(default)]
  pub bundles: BTreeMap<String, BundleDefinitions>,
  /// Output type to dependency declarations.
  #[serde(default)]
  pub dependencies: BTreeMap<String, DependencyDeclaration>,
}

impl AssetManifest {
  /// Locate the manifest in the first config directory that holds one.
  ///
  /// The manifest is mandatory: when no directory holds one the request fails with
  /// [`AssetError::ConfigMissing`].
  pub fn discover<P: AsRef<Path>>(config_dirs: &[P]) -> Result<Self> {
    for dir in config_dirs {
      for file in MANIFEST_FILES {
        let candidate = dir.as_ref().join(file);
        if candidate.is_file() {
          debug!(path = %candidate.display(), "loading asset manifest");
          return Self::from_path(&candidate);
        }
      }
    }

    Err(AssetError::ConfigMissing {
      file: MANIFEST_FILES[0].to_string(),
      searched: config_dirs
        .iter()
        .map(|dir| dir.as_ref().to_path_buf())
        .collect(),
    })
  }

  /// Read the manifest from a specific JSON or YAML file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|err| AssetError::io(path, err))?;
    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let manifest: Self = if is_yaml {
      serde_yaml::from_str(&content).map_err(|err| AssetError::ConfigParse {
        path: path.to_path_buf(),
        message: err.to_string(),
      })?
    } else {
      serde_json::from_str(&content).map_err(|err| AssetError::ConfigParse {
        path: path.to_path_buf(),
        message: err.to_string(),
      })?
    };

    Ok(manifest.with_derived_paths())
  }

  /// Parse a manifest from an in-memory JSON document.
  pub fn from_json_str(content: &str) -> Result<Self> {
    let manifest: Self = serde_json::from_str(content).map_err(|err| AssetError::ConfigParse {
      path: PathBuf::from("<inline>"),
      message: err.to_string(),
    })?;
    Ok(manifest.with_derived_paths())
  }

  fn with_derived_paths(mut self) -> Self {
    self.dist_path = self.static_path.join(&self.assets_path);
    self
  }

  /// Identifiers of a named bundle.
  pub fn bundle(&self, output: &str, name: &str) -> Result<&[String]> {
    self
      .bundles
      .get(output)
      .and_then(|bundles| bundles.get(name))
      .map(Vec::as_slice)
      .ok_or_else(|| AssetError::UnknownBundle {
        output: output.to_string(),
        bundle: name.to_string(),
      })
  }

  /// Dependency declarations of an output type, if any were declared.
  pub fn dependencies_for(&self, output: &str) -> Option<&DependencyDeclaration> {
    self.dependencies.get(output)
  }

  /// Public URL of an artifact target path.
  pub fn asset_url(&self, target_path: &str) -> String {
    format!("{}/{}", self.assets_path.trim_end_matches('/'), target_path)
  }
}
