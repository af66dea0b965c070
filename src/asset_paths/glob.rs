use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::error::{AssetError, Result};

/// Returns true when the final segment of an identifier is a `*` pattern.
pub fn is_glob(identifier: &str) -> bool {
    identifier
        .rsplit('/')
        .next()
        .is_some_and(|segment| segment.contains('*'))
}

/// Expand a bare identifier into the source-relative paths it covers.
///
/// Plain identifiers must name an existing file. Patterns are matched against the entries
/// of their directory only (no recursion) and come back sorted so the resulting composite
/// is deterministic.
pub fn expand_source_identifier(root: &Path, identifier: &str) -> Result<Vec<String>> {
    let normalised = identifier.replace('\\', "/");
    let trimmed = normalised.trim_start_matches("./");

    if !is_glob(trimmed) {
        if root.join(trimmed).is_file() {
            return Ok(vec![trimmed.to_string()]);
        }
        return Err(unknown(identifier));
    }

    let (dir, pattern) = match trimmed.rsplit_once('/') {
        Some((dir, pattern)) => (dir, pattern),
        None => ("", trimmed),
    };
    if dir.contains('*') {
        return Err(unknown(identifier));
    }

    let Ok(matcher) = Pattern::new(pattern) else {
        return Err(unknown(identifier));
    };
    let entries = match fs::read_dir(root.join(dir)) {
        Ok(entries) => entries,
        Err(_) => return Err(unknown(identifier)),
    };

    let mut matches = Vec::new();
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|ft| ft.is_file()) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.starts_with('.') || !matcher.matches_with(&file_name, segment_options()) {
            continue;
        }
        matches.push(if dir.is_empty() {
            file_name
        } else {
            format!("{dir}/{file_name}")
        });
    }

    if matches.is_empty() {
        return Err(unknown(identifier));
    }

    matches.sort();
    Ok(matches)
}

fn segment_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    }
}

fn unknown(identifier: &str) -> AssetError {
    AssetError::UnknownAsset {
        identifier: identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_patterns_in_final_segment_only() {
        assert!(is_glob("js/*.js"));
        assert!(is_glob("*.css"));
        assert!(!is_glob("js/app.js"));
    }

    #[test]
    fn resolves_plain_identifiers_that_exist() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        fs::write(dir.path().join("js/app.js"), "app").unwrap();

        assert_eq!(
            expand_source_identifier(dir.path(), "./js/app.js").unwrap(),
            vec!["js/app.js".to_string()]
        );
        assert!(matches!(
            expand_source_identifier(dir.path(), "js/missing.js"),
            Err(AssetError::UnknownAsset { .. })
        ));
    }

    #[test]
    fn expands_patterns_sorted() {
        let dir = tempdir().unwrap();
        let css = dir.path().join("css");
        fs::create_dir_all(css.join("nested")).unwrap();
        fs::write(css.join("b.css"), "b").unwrap();
        fs::write(css.join("a.css"), "a").unwrap();
        fs::write(css.join("notes.txt"), "n").unwrap();
        fs::write(css.join(".hidden.css"), "h").unwrap();

        assert_eq!(
            expand_source_identifier(dir.path(), "css/*.css").unwrap(),
            vec!["css/a.css".to_string(), "css/b.css".to_string()]
        );
    }

    #[test]
    fn patterns_anchor_to_the_whole_file_name() {
        let dir = tempdir().unwrap();
        let js = dir.path().join("js");
        fs::create_dir_all(&js).unwrap();
        for name in ["site.js", "site.min.js", "mysite.js", "site.js.map"] {
            fs::write(js.join(name), name).unwrap();
        }

        assert_eq!(
            expand_source_identifier(dir.path(), "js/site*.js").unwrap(),
            vec!["js/site.js".to_string(), "js/site.min.js".to_string()]
        );
    }

    #[test]
    fn empty_pattern_matches_are_unknown_assets() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            expand_source_identifier(dir.path(), "css/*.css"),
            Err(AssetError::UnknownAsset { ref identifier }) if identifier == "css/*.css"
        ));
    }
}
