//! Turn expanded identifier lists into concrete assets.
//!
//! Bare identifiers are read from the application directory (patterns expand into one
//! leaf per matching file). Reference tokens are materialised once per session through the
//! [`AssetRegistry`] and shared by every composite that includes them.

mod registry;
mod source;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::asset_paths::{asset_name, expand_source_identifier};
use crate::config::AssetManifest;
use crate::error::Result;
use crate::models::{AssetId, FilterSpec};
use crate::references::reference_path;

pub use registry::AssetRegistry;
pub use source::{FsSourceReader, SourceReader};

/// A single source file and its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafAsset {
  /// Identifier relative to the application directory.
  pub identifier: String,
  /// Location on disk.
  pub source_path: PathBuf,
  /// Unfiltered content, read once when the leaf was created.
  pub content: String,
}

/// Member of a resolved composite.
#[derive(Debug, Clone)]
pub enum AssetPart {
  /// A file read for this composite.
  Leaf(Arc<LeafAsset>),
  /// A reference shared through the session registry.
  Reference {
    /// Reference name.
    name: String,
    /// Registered asset.
    asset: Arc<ResolvedAsset>,
  },
}

/// Ordered composite of sources plus the filter chain requested for it.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
  cache_key: String,
  parts: Vec<AssetPart>,
  filters: Vec<FilterSpec>,
}

impl ResolvedAsset {
  /// Key identifying what was requested; also the artifact name.
  pub fn cache_key(&self) -> &str {
    &self.cache_key
  }

  /// Direct members, in request order.
  pub fn parts(&self) -> &[AssetPart] {
    &self.parts
  }

  /// Requested filter chain.
  pub fn filters(&self) -> &[FilterSpec] {
    &self.filters
  }

  /// Flattened leaves in iteration order. A source reached twice is kept at its first
  /// position only.
  pub fn leaves(&self) -> Vec<Arc<LeafAsset>> {
    let mut seen = HashSet::new();
    let mut leaves = Vec::new();
    self.collect_leaves(&mut seen, &mut leaves);
    leaves
  }

  fn collect_leaves(&self, seen: &mut HashSet<PathBuf>, leaves: &mut Vec<Arc<LeafAsset>>) {
    for part in &self.parts {
      match part {
        AssetPart::Leaf(leaf) => {
          if seen.insert(leaf.source_path.clone()) {
            leaves.push(Arc::clone(leaf));
          }
        }
        AssetPart::Reference { asset, .. } => asset.collect_leaves(seen, leaves),
      }
    }
  }
}

/// Resolves identifiers for one output type against the manifest.
pub struct AssetResolver<'a> {
  manifest: &'a AssetManifest,
  output: &'a str,
  reader: &'a dyn SourceReader,
}

impl<'a> AssetResolver<'a> {
  /// Create a resolver for an output type.
  pub fn new(manifest: &'a AssetManifest, output: &'a str, reader: &'a dyn SourceReader) -> Self {
    Self {
      manifest,
      output,
      reader,
    }
  }

  /// Manifest the resolver reads from.
  pub fn manifest(&self) -> &'a AssetManifest {
    self.manifest
  }

  /// Output type being resolved.
  pub fn output(&self) -> &'a str {
    self.output
  }

  /// Materialise one source path without filters.
  pub fn resolve_single(&self, source_path: &str) -> Result<ResolvedAsset> {
    Ok(ResolvedAsset {
      cache_key: source_path.to_string(),
      parts: self.read_leaves(source_path)?,
      filters: Vec::new(),
    })
  }

  /// Registered asset for a reference, materialising it on first use.
  pub fn resolve_reference(
    &self,
    registry: &mut AssetRegistry,
    reference: &str,
  ) -> Result<Arc<ResolvedAsset>> {
    if let Some(asset) = registry.get(self.output, reference) {
      return Ok(asset);
    }

    let path = reference_path(self.manifest, self.output, reference)?;
    debug!(reference, path, output = self.output, "materialising reference");
    let mut asset = self.resolve_single(path)?;
    asset.cache_key = AssetId::reference(reference).to_string();
    Ok(registry.insert(self.output, reference, asset))
  }

  /// Wrap identifiers, in order, into one composite carrying `filters`.
  pub fn resolve(
    &self,
    registry: &mut AssetRegistry,
    identifiers: &[AssetId],
    filters: &[FilterSpec],
  ) -> Result<ResolvedAsset> {
    let mut parts = Vec::new();
    for identifier in identifiers {
      match identifier {
        AssetId::Path(path) => parts.extend(self.read_leaves(path)?),
        AssetId::Reference(name) => {
          let asset = self.resolve_reference(registry, name)?;
          parts.push(AssetPart::Reference {
            name: name.clone(),
            asset,
          });
        }
      }
    }

    Ok(ResolvedAsset {
      cache_key: asset_name(identifiers, filters, self.output),
      parts,
      filters: filters.to_vec(),
    })
  }

  fn read_leaves(&self, identifier: &str) -> Result<Vec<AssetPart>> {
    let root = &self.manifest.app_path;
    expand_source_identifier(root, identifier)?
      .into_iter()
      .map(|relative| -> Result<AssetPart> {
        let source_path = root.join(&relative);
        let content = self.reader.read(&source_path)?;
        Ok(AssetPart::Leaf(Arc::new(LeafAsset {
          identifier: relative,
          source_path,
          content,
        })))
      })
      .collect()
  }
}
