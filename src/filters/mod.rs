//! Content filters applied to assets before they are written.
//!
//! Filters are looked up by name in a [`FilterManager`]. The built-in set covers two
//! stylesheet compilers (`less` and `sass` variable resolution) and the usual stylesheet
//! post-processors (`cssmin`, `cssrewrite`, `cssembed`). Hosts can register their own.

mod embed;
mod minify;
mod rewrite;
mod variables;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{AssetError, Result};
use crate::models::{FilterSpec, OutputMode};

pub use embed::CssEmbedFilter;
pub use minify::CssMinFilter;
pub use rewrite::CssRewriteFilter;
pub use variables::{LessVariablesFilter, SassVariablesFilter};

/// Where the content being filtered comes from and where it will be written.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
  /// Location of the leaf source on disk.
  pub source_path: &'a Path,
  /// Directory the artifact is written to.
  pub target_dir: &'a Path,
}

/// A content transformation.
pub trait Filter: Send + Sync {
  /// Transform `content`, returning a diagnostic when it cannot be processed.
  fn apply(&self, content: &str, context: &FilterContext<'_>) -> anyhow::Result<String>;
}

/// Named filter registry.
pub struct FilterManager {
  filters: BTreeMap<String, Box<dyn Filter>>,
}

impl Default for FilterManager {
  fn default() -> Self {
    let mut manager = Self::empty();
    manager.register("less", LessVariablesFilter);
    manager.register("sass", SassVariablesFilter);
    manager.register("scss", SassVariablesFilter);
    manager.register("cssmin", CssMinFilter);
    manager.register("cssrewrite", CssRewriteFilter);
    manager.register("cssembed", CssEmbedFilter::default());
    manager
  }
}

impl std::fmt::Debug for FilterManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FilterManager")
      .field("filters", &self.filters.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl FilterManager {
  /// Registry without any filters.
  pub fn empty() -> Self {
    Self {
      filters: BTreeMap::new(),
    }
  }

  /// Register or replace a filter.
  pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
    self.filters.insert(name.into(), Box::new(filter));
  }

  /// Returns true when a filter with this name is registered.
  pub fn has(&self, name: &str) -> bool {
    self.filters.contains_key(name)
  }

  /// Fail with [`AssetError::UnknownFilter`] for the first unregistered name.
  pub fn validate(&self, specs: &[FilterSpec]) -> Result<()> {
    match specs.iter().find(|spec| !self.has(&spec.name)) {
      Some(spec) => Err(AssetError::UnknownFilter {
        name: spec.name.clone(),
      }),
      None => Ok(()),
    }
  }

  /// Run the chain over one leaf, skipping filters that do not apply in `mode`.
  pub fn apply_chain(
    &self,
    specs: &[FilterSpec],
    mode: OutputMode,
    content: &str,
    context: &FilterContext<'_>,
    asset: &str,
  ) -> Result<String> {
    let mut current = content.to_string();
    for spec in specs.iter().filter(|spec| spec.applies_in(mode)) {
      let filter = self
        .filters
        .get(&spec.name)
        .ok_or_else(|| AssetError::UnknownFilter {
          name: spec.name.clone(),
        })?;
      debug!(asset, filter = %spec.name, "applying filter");
      current = filter
        .apply(&current, context)
        .map_err(|err| AssetError::FilterFailure {
          asset: asset.to_string(),
          filter: spec.name.clone(),
          message: format!("{err:#}"),
        })?;
    }
    Ok(current)
  }
}
