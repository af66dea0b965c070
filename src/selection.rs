//! Host tag parameters and their validation into a resolution request.

use crate::error::{AssetError, Result};
use crate::models::{FilterSpec, OutputMode};

/// Raw inputs the host passes to the asset tag on every invocation.
#[derive(Debug, Clone, Default)]
pub struct TagParams {
  /// Output type, e.g. `css` or `js`.
  pub output: String,
  /// Emit one artifact per source instead of one bundle.
  pub debug: bool,
  /// Named bundle to render.
  pub bundle: Option<String>,
  /// Comma-separated asset identifiers to render.
  pub assets: Option<String>,
  /// Comma-separated filter names.
  pub filters: Option<String>,
}

/// What a request renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSelection {
  /// A bundle from the manifest's bundle definitions.
  Bundle(String),
  /// An explicit list of identifiers, expanded through the dependency declarations.
  Assets(Vec<String>),
}

/// Validated resolution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
  /// Output type.
  pub output: String,
  /// Publishing mode.
  pub mode: OutputMode,
  /// Bundle or asset list.
  pub selection: AssetSelection,
  /// Filter chain, in application order.
  pub filters: Vec<FilterSpec>,
}

impl TryFrom<&TagParams> for AssetRequest {
  type Error = AssetError;

  fn try_from(params: &TagParams) -> Result<Self> {
    let output = params.output.trim();
    if output.is_empty() {
      return Err(AssetError::InvalidRequest("missing output type".into()));
    }

    let bundle = params
      .bundle
      .as_deref()
      .map(str::trim)
      .filter(|bundle| !bundle.is_empty());
    let selection = match (bundle, params.assets.as_deref()) {
      (Some(_), Some(_)) => {
        return Err(AssetError::InvalidRequest(
          "provide either a bundle or an asset list, not both".into(),
        ));
      }
      (Some(bundle), None) => AssetSelection::Bundle(bundle.to_string()),
      (None, Some(assets)) => {
        let assets = normalise_list(assets);
        if assets.is_empty() {
          return Err(AssetError::InvalidRequest("asset list is empty".into()));
        }
        AssetSelection::Assets(assets)
      }
      (None, None) => {
        return Err(AssetError::InvalidRequest(
          "a bundle or an asset list is required".into(),
        ));
      }
    };

    let filters = params
      .filters
      .as_deref()
      .map(normalise_list)
      .unwrap_or_default()
      .iter()
      .map(|name| FilterSpec::parse(name))
      .filter(|spec| !spec.name.is_empty())
      .collect();

    Ok(Self {
      output: output.to_string(),
      mode: OutputMode::from_debug(params.debug),
      selection,
      filters,
    })
  }
}

/// Split a comma-separated host value into trimmed, non-empty entries.
///
/// Order is preserved; repeated entries keep their first position only.
pub fn normalise_list(value: &str) -> Vec<String> {
  let mut entries: Vec<String> = Vec::new();
  for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
    if !entries.iter().any(|existing| existing == entry) {
      entries.push(entry.to_string());
    }
  }
  entries
}
