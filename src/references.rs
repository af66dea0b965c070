//! Reference index over the per-output dependency declarations.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::config::AssetManifest;
use crate::error::{AssetError, Result};

/// Dependency declaration of one output type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyDeclaration {
  /// Reference name to source path, in declaration order.
  #[serde(default)]
  pub references: ReferenceTable,
  /// Asset name to the reference names it requires first.
  #[serde(default)]
  pub assets: BTreeMap<String, Vec<String>>,
}

impl DependencyDeclaration {
  /// Reference names the asset requires, or an empty slice when it declares none.
  pub fn requirements_of(&self, asset: &str) -> &[String] {
    self.assets.get(asset).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Named references kept in the order they were declared.
///
/// First-match lookups by path depend on declaration order, so this is a list of pairs
/// rather than a sorted map. A name declared twice keeps its first position and takes the
/// last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
  entries: Vec<(String, String)>,
}

impl ReferenceTable {
  /// Insert or replace a reference.
  pub fn insert(&mut self, name: impl Into<String>, path: impl Into<String>) {
    let name = name.into();
    let path = path.into();
    match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
      Some(entry) => entry.1 = path,
      None => self.entries.push((name, path)),
    }
  }

  /// Source path a reference points to.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(existing, _)| existing == name)
      .map(|(_, path)| path.as_str())
  }

  /// First reference, in declaration order, whose path equals `path`.
  pub fn find_by_path(&self, path: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(_, existing)| existing == path)
      .map(|(name, _)| name.as_str())
  }

  /// Iterate `(name, path)` pairs in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|(name, path)| (name.as_str(), path.as_str()))
  }

  /// Number of declared references.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns true when no references are declared.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<N: Into<String>, P: Into<String>> FromIterator<(N, P)> for ReferenceTable {
  fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
    let mut table = Self::default();
    for (name, path) in iter {
      table.insert(name, path);
    }
    table
  }
}

impl<'de> Deserialize<'de> for ReferenceTable {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct TableVisitor;

    impl<'de> Visitor<'de> for TableVisitor {
      type Value = ReferenceTable;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of reference names to source paths")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = ReferenceTable::default();
        while let Some((name, path)) = access.next_entry::<String, String>()? {
          table.insert(name, path);
        }
        Ok(table)
      }
    }

    deserializer.deserialize_map(TableVisitor)
  }
}

/// Reference name aliasing `source_path` for the output type, if any.
pub fn find_reference_for<'a>(
  manifest: &'a AssetManifest,
  output: &str,
  source_path: &str,
) -> Option<&'a str> {
  manifest
    .dependencies_for(output)
    .and_then(|declaration| declaration.references.find_by_path(source_path))
}

/// Source path a named reference points to.
pub fn reference_path<'a>(
  manifest: &'a AssetManifest,
  output: &str,
  reference: &str,
) -> Result<&'a str> {
  manifest
    .dependencies_for(output)
    .and_then(|declaration| declaration.references.get(reference))
    .ok_or_else(|| AssetError::UnknownReference {
      output: output.to_string(),
      reference: reference.to_string(),
    })
}
