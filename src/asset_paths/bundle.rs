use sha2::{Digest, Sha256};

use crate::models::{AssetId, FilterSpec};

/// Length of the hex prefixes used for asset names and cache-busting signatures.
pub const HASH_PREFIX_LEN: usize = 7;

/// Short SHA-256 hex digest over a sequence of byte chunks.
///
/// Every chunk is length-prefixed so that `["ab", "c"]` and `["a", "bc"]` do not collide.
pub fn short_hash<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update((chunk.len() as u64).to_le_bytes());
        hasher.update(chunk);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_PREFIX_LEN].to_string()
}

/// Stable name of a request, derived from what was asked for rather than file contents.
pub fn asset_name(identifiers: &[AssetId], filters: &[FilterSpec], output: &str) -> String {
    let identifiers: Vec<String> = identifiers.iter().map(ToString::to_string).collect();
    let filters: Vec<&str> = filters.iter().map(|filter| filter.name.as_str()).collect();

    short_hash(
        identifiers
            .iter()
            .map(|identifier| identifier.as_bytes())
            .chain(filters.iter().map(|name| name.as_bytes()))
            .chain(std::iter::once(output.as_bytes())),
    )
}

/// Target path of the combined production artifact.
pub fn combined_target_path(name: &str, signature: &str, output: &str) -> String {
    format!("{name}-{signature}.{output}")
}

/// Target path of a single leaf artifact in debug mode. `position` is 1-based.
pub fn leaf_target_path(
    name: &str,
    position: usize,
    source_path: &str,
    signature: &str,
    output: &str,
) -> String {
    format!(
        "{name}_part_{position}_{}-{signature}.{output}",
        sanitize_stem(source_path)
    )
}

fn sanitize_stem(source_path: &str) -> String {
    let file_name = source_path
        .replace('\\', "/")
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name);

    let mut base = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>();

    while base.contains("__") {
        base = base.replace("__", "_");
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_short_and_boundary_sensitive() {
        let one = short_hash([b"ab".as_slice(), b"c".as_slice()]);
        let two = short_hash([b"a".as_slice(), b"bc".as_slice()]);
        assert_eq!(one.len(), HASH_PREFIX_LEN);
        assert_ne!(one, two);
    }

    #[test]
    fn asset_name_depends_on_identifiers_filters_and_output() {
        let ids = vec![AssetId::reference("jquery"), AssetId::Path("app.js".into())];
        let base = asset_name(&ids, &[], "js");
        assert_eq!(base, asset_name(&ids, &[], "js"));
        assert_ne!(base, asset_name(&ids[1..], &[], "js"));
        assert_ne!(base, asset_name(&ids, &[FilterSpec::parse("cssmin")], "js"));
        assert_ne!(base, asset_name(&ids, &[], "css"));
    }

    #[test]
    fn builds_combined_and_leaf_targets() {
        assert_eq!(combined_target_path("abc1234", "def5678", "css"), "abc1234-def5678.css");
        assert_eq!(
            leaf_target_path("abc1234", 2, "css\\theme/site.main.less", "def5678", "css"),
            "abc1234_part_2_site_main-def5678.css"
        );
    }
}
