//! Entity key normalization.

/// Organism slug: lower-cased, each run of spaces and dots replaced by one underscore.
///
/// ```
/// use apollo_monitor::storage::organism_slug;
///
/// assert_eq!(organism_slug("Homo sapiens"), "homo_sapiens");
/// assert_eq!(organism_slug("C. elegans"), "c_elegans");
/// ```
pub fn organism_slug(common_name: &str) -> String {
    static SEPARATOR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = SEPARATOR_REGEX
        .get_or_init(|| regex::Regex::new(r"[ .]+").expect("failed to compile slug regex"));

    regex
        .replace_all(&common_name.to_lowercase(), "_")
        .into_owned()
}

/// Strip a configured suffix from a username, case preserved.
///
/// Repeated trailing occurrences are all removed so the result never ends with
/// the suffix. An empty suffix leaves the name untouched.
pub fn strip_user_suffix<'a>(username: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return username;
    }
    let mut name = username;
    while let Some(stripped) = name.strip_suffix(suffix) {
        name = stripped;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organism_slug() {
        assert_eq!(organism_slug("Homo sapiens"), "homo_sapiens");
        assert_eq!(organism_slug("C. elegans"), "c_elegans");
        assert_eq!(organism_slug("Apis mellifera v4.5"), "apis_mellifera_v4_5");
        assert_eq!(organism_slug("already_slug"), "already_slug");
        assert_eq!(organism_slug("D.  rerio"), "d_rerio");
    }

    #[test]
    fn test_strip_user_suffix() {
        assert_eq!(strip_user_suffix("Alice@example.org", "@example.org"), "Alice");
        assert_eq!(strip_user_suffix("bob@other.org", "@example.org"), "bob@other.org");
        assert_eq!(strip_user_suffix("carol", ""), "carol");
    }

    #[test]
    fn test_strip_user_suffix_is_idempotent() {
        let suffix = "@example.org";
        for name in ["alice@example.org", "bob", "@example.org", "x@example.org@example.org"] {
            let once = strip_user_suffix(name, suffix);
            let twice = strip_user_suffix(once, suffix);
            assert_eq!(once, twice, "{name}");
            assert!(!once.ends_with(suffix), "{name}");
        }
        assert_eq!(strip_user_suffix("x@example.org@example.org", suffix), "x");
    }
}
