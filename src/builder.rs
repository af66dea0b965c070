//! Render-session orchestrator: expand, resolve, compile and write one request at a time.

use tracing::{debug, info};

use crate::compiler::BundleCompiler;
use crate::config::AssetManifest;
use crate::error::Result;
use crate::expand::expand;
use crate::filters::FilterManager;
use crate::models::{ArtifactSummary, AssetId, OutputMode};
use crate::resolver::{AssetRegistry, AssetResolver, SourceReader};
use crate::selection::{AssetRequest, AssetSelection};
use crate::writer::AssetWriter;

/// Artifacts written for one request, in the order the compiler produced them.
#[derive(Debug, Clone)]
pub struct BuildReport {
  /// Publishing mode of the request.
  pub mode: OutputMode,
  /// Identifiers the request resolved to.
  pub identifiers: Vec<AssetId>,
  /// One entry per written or cached artifact.
  pub artifacts: Vec<ArtifactSummary>,
}

impl BuildReport {
  /// Public artifact URLs. In debug mode this list is reversed relative to page order.
  pub fn urls(&self) -> Vec<String> {
    self
      .artifacts
      .iter()
      .map(|artifact| artifact.url.clone())
      .collect()
  }
}

/// One render session over a manifest.
///
/// The session owns the asset registry, so every request built through the same builder
/// shares materialised references and never lists a reference twice. Use a fresh builder
/// per render.
pub struct AssetBuilder<'a> {
  manifest: &'a AssetManifest,
  filters: &'a FilterManager,
  reader: &'a dyn SourceReader,
  writer: AssetWriter,
  registry: AssetRegistry,
}

impl<'a> AssetBuilder<'a> {
  /// Start a session writing into the manifest's distribution directory.
  pub fn new(
    manifest: &'a AssetManifest,
    filters: &'a FilterManager,
    reader: &'a dyn SourceReader,
  ) -> Self {
    Self {
      manifest,
      filters,
      reader,
      writer: AssetWriter::new(&manifest.dist_path),
      registry: AssetRegistry::new(),
    }
  }

  /// Manifest of the session.
  pub fn manifest(&self) -> &'a AssetManifest {
    self.manifest
  }

  /// References materialised so far in this session.
  pub fn registry(&self) -> &AssetRegistry {
    &self.registry
  }

  /// Resolve, compile and write one request.
  ///
  /// References materialised by the request are committed to the session registry only
  /// when the request succeeds; a failed request leaves the session as it found it.
  pub fn build(&mut self, request: &AssetRequest) -> Result<BuildReport> {
    let mut staged = self.registry.clone();
    let report = self.build_with(&mut staged, request)?;
    self.registry = staged;
    Ok(report)
  }

  fn build_with(&self, registry: &mut AssetRegistry, request: &AssetRequest) -> Result<BuildReport> {
    self.filters.validate(&request.filters)?;
    let output = request.output.as_str();
    let resolver = AssetResolver::new(self.manifest, output, self.reader);

    let identifiers: Vec<AssetId> = match &request.selection {
      AssetSelection::Bundle(name) => self
        .manifest
        .bundle(output, name)?
        .iter()
        .map(|identifier| AssetId::parse(identifier))
        .collect(),
      AssetSelection::Assets(assets) => expand(&resolver, registry, assets)?,
    };
    debug!(output, count = identifiers.len(), "resolving request");

    let asset = resolver.resolve(registry, &identifiers, &request.filters)?;
    let compiler = BundleCompiler::new(self.manifest, output, self.filters);
    let artifacts = compiler.compile(&asset, request.mode)?;

    let mut summaries = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
      let outcome = self.writer.write_artifact(artifact)?;
      summaries.push(ArtifactSummary {
        url: self.manifest.asset_url(&artifact.target_path),
        outcome,
        sources: artifact.sources.clone(),
      });
    }

    info!(
      output,
      name = asset.cache_key(),
      artifacts = summaries.len(),
      "built asset request"
    );
    Ok(BuildReport {
      mode: request.mode,
      identifiers,
      artifacts: summaries,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::AssetError;
  use crate::models::{FilterSpec, WriteOutcome};
  use crate::resolver::FsSourceReader;
  use std::fs;
  use tempfile::{TempDir, tempdir};

  fn fixture() -> (TempDir, AssetManifest) {
    let dir = tempdir().unwrap();
    let app = dir.path().join("app");
    for (path, content) in [
      ("css/reset.css", "html { margin: 0; }"),
      ("css/layout.css", "main { display: grid; }"),
      ("css/theme.css", "a { color: navy; }"),
      ("lib/jquery.js", "window.$ = {};"),
      ("js/app.js", "$.app();"),
      ("js/admin.js", "$.admin();"),
      ("css/site.css", ".site {}"),
      ("lib/bootstrap.css", ".btn {}"),
      ("lib/bootstrap.js", "window.bs = {};"),
      ("js/widgets.js", "bs.run();"),
    ] {
      let file = app.join(path);
      fs::create_dir_all(file.parent().unwrap()).unwrap();
      fs::write(file, content).unwrap();
    }

    let manifest = AssetManifest::from_json_str(&format!(
      r#"{{
        "staticPath": {}, "assetsPath": "assets", "appPath": {},
        "bundles": {{ "css": {{ "main": ["css/reset.css", "css/layout.css", "css/theme.css"] }} }},
        "dependencies": {{
          "css": {{
            "references": {{ "bootstrap": "lib/bootstrap.css" }},
            "assets": {{ "css/site.css": ["bootstrap"] }}
          }},
          "js": {{
            "references": {{ "jquery": "lib/jquery.js", "bootstrap": "lib/bootstrap.js", "ui": "lib/ui.js" }},
            "assets": {{
              "js/app.js": ["jquery"],
              "js/admin.js": ["jquery", "ui"],
              "js/widgets.js": ["bootstrap"]
            }}
          }}
        }}
      }}"#,
      serde_json::to_string(&dir.path().join("public")).unwrap(),
      serde_json::to_string(&app).unwrap(),
    ))
    .unwrap();
    (dir, manifest)
  }

  fn request(output: &str, selection: AssetSelection, mode: OutputMode) -> AssetRequest {
    AssetRequest {
      output: output.into(),
      mode,
      selection,
      filters: Vec::new(),
    }
  }

  #[test]
  fn production_bundle_writes_one_artifact() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

    let report = builder
      .build(&request("css", AssetSelection::Bundle("main".into()), OutputMode::Production))
      .unwrap();

    assert_eq!(report.artifacts.len(), 1);
    let url = &report.artifacts[0].url;
    assert!(url.starts_with("assets/"));
    let written = manifest.dist_path.join(url.trim_start_matches("assets/"));
    assert_eq!(
      fs::read_to_string(written).unwrap(),
      "html { margin: 0; }\nmain { display: grid; }\na { color: navy; }"
    );
  }

  #[test]
  fn repeated_builds_are_served_from_the_cache() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let main = request("css", AssetSelection::Bundle("main".into()), OutputMode::Debug);

    let first = AssetBuilder::new(&manifest, &filters, &FsSourceReader).build(&main).unwrap();
    let second = AssetBuilder::new(&manifest, &filters, &FsSourceReader).build(&main).unwrap();

    assert_eq!(first.urls(), second.urls());
    assert!(first.artifacts.iter().all(|a| a.outcome == WriteOutcome::Written));
    assert!(second.artifacts.iter().all(|a| a.outcome == WriteOutcome::Cached));
  }

  #[test]
  fn asset_lists_are_expanded_through_dependencies() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

    let report = builder
      .build(&request(
        "js",
        AssetSelection::Assets(vec!["js/app.js".into(), "lib/jquery.js".into()]),
        OutputMode::Debug,
      ))
      .unwrap();

    let ids: Vec<String> = report.identifiers.iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["@jquery", "js/app.js"]);
    assert_eq!(report.artifacts.len(), 2);
    assert!(report.artifacts[1].sources[0].ends_with("lib/jquery.js"));
    assert!(builder.registry().contains("js", "jquery"));
  }

  #[test]
  fn unknown_bundles_write_nothing() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

    let err = builder
      .build(&request("css", AssetSelection::Bundle("print".into()), OutputMode::Production))
      .unwrap_err();

    assert!(matches!(err, AssetError::UnknownBundle { .. }));
    assert!(!manifest.dist_path.exists());
  }

  #[test]
  fn unknown_filters_fail_the_request() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);
    let mut main = request("css", AssetSelection::Bundle("main".into()), OutputMode::Production);
    main.filters.push(FilterSpec::parse("stylus"));

    assert!(matches!(builder.build(&main), Err(AssetError::UnknownFilter { .. })));
    assert!(!manifest.dist_path.exists());
  }

  fn assets(output: &str, list: &[&str]) -> AssetRequest {
    request(
      output,
      AssetSelection::Assets(list.iter().map(|id| id.to_string()).collect()),
      OutputMode::Production,
    )
  }

  fn tokens(report: &BuildReport) -> Vec<String> {
    report.identifiers.iter().map(ToString::to_string).collect()
  }

  #[test]
  fn reference_names_shared_between_output_types_resolve_separately() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

    let css = builder.build(&assets("css", &["css/site.css"])).unwrap();
    let js = builder.build(&assets("js", &["js/widgets.js"])).unwrap();

    assert_eq!(tokens(&css), vec!["@bootstrap", "css/site.css"]);
    assert_eq!(tokens(&js), vec!["@bootstrap", "js/widgets.js"]);
    let url = &js.artifacts[0].url;
    let body = fs::read_to_string(manifest.dist_path.join(url.trim_start_matches("assets/"))).unwrap();
    assert_eq!(body, "window.bs = {};\nbs.run();");
  }

  #[test]
  fn failed_requests_do_not_register_their_references() {
    let (_dir, manifest) = fixture();
    let filters = FilterManager::default();
    let mut builder = AssetBuilder::new(&manifest, &filters, &FsSourceReader);

    let err = builder.build(&assets("js", &["js/admin.js"])).unwrap_err();
    assert!(matches!(err, AssetError::UnknownAsset { .. }));
    assert!(builder.registry().is_empty());

    let report = builder.build(&assets("js", &["js/app.js"])).unwrap();
    assert_eq!(tokens(&report), vec!["@jquery", "js/app.js"]);
    assert!(builder.registry().contains("js", "jquery"));
  }
}
