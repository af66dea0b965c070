//! Apply filter chains to resolved assets and produce cache-busted artifacts.

use std::sync::Arc;

use tracing::debug;

use crate::asset_paths::{combined_target_path, leaf_target_path, short_hash};
use crate::config::AssetManifest;
use crate::error::Result;
use crate::filters::{FilterContext, FilterManager};
use crate::models::{Artifact, FilterSpec, OutputMode};
use crate::resolver::{LeafAsset, ResolvedAsset};

/// Compiles resolved assets for one output type.
pub struct BundleCompiler<'a> {
  manifest: &'a AssetManifest,
  output: &'a str,
  filters: &'a FilterManager,
}

impl<'a> BundleCompiler<'a> {
  /// Create a compiler writing into the manifest's distribution directory.
  pub fn new(manifest: &'a AssetManifest, output: &'a str, filters: &'a FilterManager) -> Self {
    Self {
      manifest,
      output,
      filters,
    }
  }

  /// Compile `asset` for `mode`.
  ///
  /// Production yields exactly one artifact covering every leaf. Debug yields one artifact
  /// per leaf, returned in *reverse* leaf order: the debug iterator counts down from the
  /// end of the list, so the first leaf in page order is surfaced first.
  pub fn compile(&self, asset: &ResolvedAsset, mode: OutputMode) -> Result<Vec<Artifact>> {
    self.filters.validate(asset.filters())?;
    let active: Vec<&FilterSpec> = asset
      .filters()
      .iter()
      .filter(|spec| spec.applies_in(mode))
      .collect();
    let leaves = asset.leaves();

    let artifacts = match mode {
      OutputMode::Production => vec![self.combined(asset, &leaves, &active)?],
      OutputMode::Debug => {
        let mut artifacts = leaves
          .iter()
          .enumerate()
          .map(|(index, leaf)| self.single(asset, index + 1, leaf, &active))
          .collect::<Result<Vec<_>>>()?;
        artifacts.reverse();
        artifacts
      }
    };

    debug!(
      name = asset.cache_key(),
      output = self.output,
      ?mode,
      count = artifacts.len(),
      "compiled artifacts"
    );
    Ok(artifacts)
  }

  fn combined(
    &self,
    asset: &ResolvedAsset,
    leaves: &[Arc<LeafAsset>],
    active: &[&FilterSpec],
  ) -> Result<Artifact> {
    let mut parts = Vec::with_capacity(leaves.len());
    for leaf in leaves {
      parts.push(self.filter_leaf(asset, leaf, OutputMode::Production)?);
    }

    let signature = signature(parts.iter().map(String::as_str), active);
    Ok(Artifact {
      target_path: combined_target_path(asset.cache_key(), &signature, self.output),
      content: parts.join("\n"),
      sources: leaves.iter().map(|leaf| leaf.source_path.clone()).collect(),
    })
  }

  fn single(
    &self,
    asset: &ResolvedAsset,
    position: usize,
    leaf: &LeafAsset,
    active: &[&FilterSpec],
  ) -> Result<Artifact> {
    let content = self.filter_leaf(asset, leaf, OutputMode::Debug)?;
    let signature = signature(std::iter::once(content.as_str()), active);
    Ok(Artifact {
      target_path: leaf_target_path(
        asset.cache_key(),
        position,
        &leaf.identifier,
        &signature,
        self.output,
      ),
      content,
      sources: vec![leaf.source_path.clone()],
    })
  }

  fn filter_leaf(&self, asset: &ResolvedAsset, leaf: &LeafAsset, mode: OutputMode) -> Result<String> {
    let context = FilterContext {
      source_path: &leaf.source_path,
      target_dir: &self.manifest.dist_path,
    };
    self
      .filters
      .apply_chain(asset.filters(), mode, &leaf.content, &context, &leaf.identifier)
  }
}

/// Cache-busting signature over filtered contents and the filters applied to them.
///
/// Filters may pull in files other than the leaf itself (`cssembed`), so the filtered
/// output rather than the raw source decides when the URL changes.
fn signature<'c>(contents: impl Iterator<Item = &'c str>, active: &[&FilterSpec]) -> String {
  let contents: Vec<&str> = contents.collect();
  short_hash(
    contents
      .iter()
      .map(|content| content.as_bytes())
      .chain(active.iter().map(|spec| spec.name.as_bytes())),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AssetError;
  use crate::models::AssetId;
  use crate::resolver::{AssetRegistry, AssetResolver, FsSourceReader};
  use std::collections::BTreeSet;
  use std::fs;
  use std::path::PathBuf;
  use tempfile::{TempDir, tempdir};

  fn fixture() -> (TempDir, AssetManifest) {
    let dir = tempdir().unwrap();
    let app = dir.path().join("app");
    fs::create_dir_all(app.join("css")).unwrap();
    fs::write(app.join("css/reset.css"), "html { margin: 0; }").unwrap();
    fs::write(app.join("css/layout.css"), "main { display: grid; }").unwrap();
    fs::write(app.join("css/theme.less"), "@brand: navy;\na { color: @brand; }").unwrap();

    let manifest = AssetManifest::from_json_str(&format!(
      r#"{{"staticPath": {}, "assetsPath": "assets", "appPath": {}}}"#,
      serde_json::to_string(&dir.path().join("public")).unwrap(),
      serde_json::to_string(&app).unwrap(),
    ))
    .unwrap();
    (dir, manifest)
  }

  fn resolve(manifest: &AssetManifest, filters: &[&str]) -> ResolvedAsset {
    let resolver = AssetResolver::new(manifest, "css", &FsSourceReader);
    let ids: Vec<AssetId> = ["css/reset.css", "css/layout.css", "css/theme.less"]
      .iter()
      .map(|id| AssetId::parse(id))
      .collect();
    let filters: Vec<FilterSpec> = filters.iter().map(|name| FilterSpec::parse(name)).collect();
    resolver.resolve(&mut AssetRegistry::new(), &ids, &filters).unwrap()
  }

  fn sources(artifacts: &[Artifact]) -> BTreeSet<PathBuf> {
    artifacts.iter().flat_map(|artifact| artifact.sources.clone()).collect()
  }

  #[test]
  fn production_yields_one_combined_artifact() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let asset = resolve(&manifest, &["less"]);

    let artifacts = compiler.compile(&asset, OutputMode::Production).unwrap();
    assert_eq!(artifacts.len(), 1);
    let artifact = &artifacts[0];
    assert!(artifact.target_path.starts_with(asset.cache_key()));
    assert!(artifact.target_path.ends_with(".css"));
    assert_eq!(
      artifact.content,
      "html { margin: 0; }\nmain { display: grid; }\na { color: navy; }"
    );
  }

  #[test]
  fn production_target_changes_only_when_sources_change() {
    let (dir, manifest) = fixture();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);

    let first = compiler.compile(&resolve(&manifest, &[]), OutputMode::Production).unwrap();
    let again = compiler.compile(&resolve(&manifest, &[]), OutputMode::Production).unwrap();
    assert_eq!(first[0].target_path, again[0].target_path);

    fs::write(dir.path().join("app/css/layout.css"), "main { display: flex; }").unwrap();
    let changed = compiler.compile(&resolve(&manifest, &[]), OutputMode::Production).unwrap();
    assert_ne!(first[0].target_path, changed[0].target_path);
  }

  #[test]
  fn debug_yields_one_artifact_per_leaf_in_reverse_order() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let asset = resolve(&manifest, &["less", "?cssmin"]);

    let artifacts = compiler.compile(&asset, OutputMode::Debug).unwrap();
    let names: Vec<&str> = artifacts.iter().map(|artifact| artifact.target_path.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert!(names[0].contains("_part_3_theme-"));
    assert!(names[1].contains("_part_2_layout-"));
    assert!(names[2].contains("_part_1_reset-"));
    assert_eq!(artifacts[0].content, "a { color: navy; }");
  }

  #[test]
  fn debug_and_production_cover_the_same_sources() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let asset = resolve(&manifest, &["less"]);

    let production = compiler.compile(&asset, OutputMode::Production).unwrap();
    let debug = compiler.compile(&asset, OutputMode::Debug).unwrap();
    assert_eq!(sources(&production), sources(&debug));
  }

  #[test]
  fn unknown_filters_fail_before_compiling() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let asset = resolve(&manifest, &["stylus"]);

    let err = compiler.compile(&asset, OutputMode::Production).unwrap_err();
    assert!(matches!(err, AssetError::UnknownFilter { .. }));
  }

  #[test]
  fn filter_failures_propagate_with_the_leaf_identifier() {
    let (dir, manifest) = fixture();
    fs::write(dir.path().join("app/css/theme.less"), "a { color: @missing; }").unwrap();
    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let asset = resolve(&manifest, &["less"]);

    let err = compiler.compile(&asset, OutputMode::Debug).unwrap_err();
    assert!(matches!(
      err,
      AssetError::FilterFailure { ref asset, ref filter, .. } if asset == "css/theme.less" && filter == "less"
    ));
  }

  #[test]
  fn targets_change_when_an_embedded_file_changes() {
    let (dir, manifest) = fixture();
    let css = dir.path().join("app/css");
    fs::write(css.join("icon.css"), ".icon { background: url(logo.png); }").unwrap();
    fs::write(css.join("logo.png"), [0x89, b'P', b'N', b'G', 1]).unwrap();

    let filters = FilterManager::default();
    let compiler = BundleCompiler::new(&manifest, "css", &filters);
    let compile = |mode| {
      let resolver = AssetResolver::new(&manifest, "css", &FsSourceReader);
      let asset = resolver
        .resolve(
          &mut AssetRegistry::new(),
          &[AssetId::parse("css/icon.css")],
          &[FilterSpec::parse("cssembed")],
        )
        .unwrap();
      compiler.compile(&asset, mode).unwrap()
    };

    let production = compile(OutputMode::Production);
    let debug = compile(OutputMode::Debug);
    assert!(production[0].content.contains("data:image/png;base64,"));

    fs::write(css.join("logo.png"), [0x89, b'P', b'N', b'G', 2]).unwrap();
    assert_ne!(production[0].target_path, compile(OutputMode::Production)[0].target_path);
    assert_ne!(debug[0].target_path, compile(OutputMode::Debug)[0].target_path);
  }
}
