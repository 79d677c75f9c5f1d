/// Scheme prefixes removed during normalization
const SCHEME_PREFIXES: &[&str] = &["https://", "http://"];

/// Host prefix removed during normalization
const WWW_PREFIX: &str = "www.";

/// Normalizes a URL into the scheme-less form used for on-disk paths
///
/// # Normalization Steps
///
/// 1. Strip a leading `http://` or `https://`
/// 2. Strip a leading `www.` from the host
/// 3. Strip trailing `/` separators
///
/// Prefixes are stripped until none remains, so `normalize_url` is
/// idempotent. Input that is not a URL at all passes through untouched.
///
/// # Arguments
///
/// * `url` - The URL string to normalize
///
/// # Returns
///
/// The normalized string, e.g. `example.com/docs`
///
/// # Examples
///
/// ```
/// use docs_to_markdown::url::normalize_url;
///
/// assert_eq!(normalize_url("https://www.example.com/docs/"), "example.com/docs");
/// assert_eq!(normalize_url("example.com/docs"), "example.com/docs");
/// ```
pub fn normalize_url(url: &str) -> String {
    let mut rest = url;

    loop {
        let stripped = SCHEME_PREFIXES
            .iter()
            .find_map(|prefix| rest.strip_prefix(prefix))
            .or_else(|| rest.strip_prefix(WWW_PREFIX));

        match stripped {
            Some(next) => rest = next,
            None => break,
        }
    }

    rest.trim_end_matches('/').to_string()
}
