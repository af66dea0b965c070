//! Session-scoped registry of reference-backed assets.

use std::collections::HashMap;
use std::sync::Arc;

use super::ResolvedAsset;

/// `(output type, reference name)` to the asset materialised for it.
///
/// A registry lives for one render session. Each reference is resolved at most once per
/// session and output type; later requests in the same session receive the cached instance.
/// Reference names are scoped by output type, so `css` and `js` may both declare `bootstrap`.
///
/// Cloning is cheap (entries are shared), which lets a request stage its registrations on a
/// copy and commit them only once it succeeds.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
  entries: HashMap<(String, String), Arc<ResolvedAsset>>,
}

impl AssetRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns true when the reference has already been materialised for `output`.
  pub fn contains(&self, output: &str, reference: &str) -> bool {
    self.entries.contains_key(&key(output, reference))
  }

  /// Cached asset for a reference of `output`.
  pub fn get(&self, output: &str, reference: &str) -> Option<Arc<ResolvedAsset>> {
    self.entries.get(&key(output, reference)).cloned()
  }

  /// Register an asset, keeping any entry that was registered first.
  pub fn insert(&mut self, output: &str, reference: &str, asset: ResolvedAsset) -> Arc<ResolvedAsset> {
    self
      .entries
      .entry(key(output, reference))
      .or_insert_with(|| Arc::new(asset))
      .clone()
  }

  /// Number of registered references across all output types.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns true when nothing has been registered.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

fn key(output: &str, reference: &str) -> (String, String) {
  (output.to_string(), reference.to_string())
}
