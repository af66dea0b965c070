//! Expand requested identifiers into their declared reference prerequisites.

use tracing::debug;

use crate::error::Result;
use crate::models::AssetId;
use crate::references::{find_reference_for, reference_path};
use crate::resolver::{AssetRegistry, AssetResolver};

/// Expand `requested` into an ordered list with reference prerequisites first.
///
/// References required by any requested asset are materialised into `registry` and listed
/// as `@name` tokens ahead of the requested identifiers. A reference already present in the
/// registry was emitted by an earlier request of the session and is not listed again.
/// Requested identifiers follow in input order, skipping any that are already listed either
/// directly or through the reference aliasing their path. A requested `@name` token is
/// likewise skipped when the path it names is already listed bare.
pub fn expand(
  resolver: &AssetResolver<'_>,
  registry: &mut AssetRegistry,
  requested: &[String],
) -> Result<Vec<AssetId>> {
  let manifest = resolver.manifest();
  let output = resolver.output();
  let mut expanded: Vec<AssetId> = Vec::new();

  if let Some(declaration) = manifest.dependencies_for(output) {
    for asset in requested {
      for reference in declaration.requirements_of(asset) {
        if registry.contains(output, reference) {
          continue;
        }
        resolver.resolve_reference(registry, reference)?;
        expanded.push(AssetId::reference(reference.as_str()));
      }
    }
  }

  for asset in requested {
    let identifier = AssetId::parse(asset);
    let covered = match &identifier {
      AssetId::Path(path) => find_reference_for(manifest, output, path)
        .is_some_and(|reference| expanded.contains(&AssetId::reference(reference))),
      AssetId::Reference(name) => reference_path(manifest, output, name)
        .is_ok_and(|path| expanded.contains(&AssetId::Path(path.to_string()))),
    };

    if expanded.contains(&identifier) || covered {
      debug!(asset = %asset, output, "skipping duplicate asset");
      continue;
    }
    expanded.push(identifier);
  }

  let listed: Vec<String> = expanded.iter().map(ToString::to_string).collect();
  debug!(output, expanded = ?listed, "expanded asset list");
  Ok(expanded)
}
