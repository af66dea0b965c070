use regex::Regex;

fn url_reference_ignores() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^[a-z][a-z0-9+.-]*://").expect("invalid scheme regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"(?i)^data:").expect("invalid data URI regex"),
                Regex::new(r"(?i)^mailto:").expect("invalid mailto regex"),
                Regex::new(r"^[/#]").expect("invalid absolute path regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a stylesheet `url(...)` reference must be left untouched.
///
/// External URLs, data URIs, fragments and root-absolute paths do not depend on where the
/// stylesheet lives, so moving it into the distribution directory cannot break them.
pub fn should_ignore_url_reference(value: &str) -> bool {
    value.is_empty()
        || url_reference_ignores()
            .iter()
            .any(|pattern| pattern.is_match(value))
}
