use url::Url;

/// Checks whether a discovered link belongs to the crawl rooted at `root`
///
/// A link is admissible when:
/// 1. Its serialized form starts with the serialized root URL, which
///    confines the crawl to the root's path prefix
/// 2. Its host and port equal the root's host and port exactly
///
/// Whether the link was already visited or queued is the frontier's
/// concern, not this function's.
///
/// # Arguments
///
/// * `candidate` - The absolute, fragment-free link
/// * `root` - The crawl root
///
/// # Returns
///
/// * `true` - If the link should be considered for the frontier
/// * `false` - Otherwise
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docs_to_markdown::url::is_admissible;
///
/// let root = Url::parse("https://ex.com/docs").unwrap();
/// assert!(is_admissible(&Url::parse("https://ex.com/docs/sub").unwrap(), &root));
/// assert!(!is_admissible(&Url::parse("https://ex.com/blog/x").unwrap(), &root));
/// ```
pub fn is_admissible(candidate: &Url, root: &Url) -> bool {
    candidate.as_str().starts_with(root.as_str())
        && candidate.host_str() == root.host_str()
        && candidate.port() == root.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Url {
        Url::parse("https://ex.com/docs").unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_accepts_sub_path() {
        assert!(is_admissible(&url("https://ex.com/docs/sub"), &root()));
        assert!(is_admissible(&url("https://ex.com/docs/a/b/c"), &root()));
    }

    #[test]
    fn test_accepts_root_itself() {
        assert!(is_admissible(&url("https://ex.com/docs"), &root()));
    }

    #[test]
    fn test_rejects_sibling_path() {
        assert!(!is_admissible(&url("https://ex.com/blog/x"), &root()));
        assert!(!is_admissible(&url("https://ex.com/"), &root()));
    }

    #[test]
    fn test_rejects_other_host() {
        assert!(!is_admissible(&url("https://other.com/docs/sub"), &root()));
        assert!(!is_admissible(&url("https://sub.ex.com/docs/sub"), &root()));
    }

    #[test]
    fn test_rejects_other_scheme() {
        assert!(!is_admissible(&url("http://ex.com/docs/sub"), &root()));
    }

    #[test]
    fn test_rejects_other_port() {
        let root = url("http://127.0.0.1:8080/docs");
        assert!(is_admissible(&url("http://127.0.0.1:8080/docs/a"), &root));
        assert!(!is_admissible(&url("http://127.0.0.1:9090/docs/a"), &root));
    }

    #[test]
    fn test_plain_string_prefix() {
        // Prefix matching is on the string, so a sibling sharing the prefix passes
        assert!(is_admissible(&url("https://ex.com/docs-old/page"), &root()));
    }

    #[test]
    fn test_host_root_admits_whole_site() {
        let root = url("https://ex.com");
        assert!(is_admissible(&url("https://ex.com/anything"), &root));
    }
}
