//! URL handling module
//!
//! This module provides URL normalization for on-disk path derivation,
//! start URL validation, and the link admission rules that confine a crawl
//! to its root.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::normalize_url;
pub use scope::is_admissible;

use crate::UrlError;
use url::Url;

/// Parses and validates the crawl root given on the command line
///
/// The root must be an absolute HTTP(S) URL with a host. Its fragment is
/// dropped so that it compares equal to links discovered on other pages.
///
/// # Arguments
///
/// * `start` - The start URL as typed by the user
///
/// # Returns
///
/// * `Ok(Url)` - The parsed root URL
/// * `Err(UrlError)` - The URL is malformed, not HTTP(S), or has no host
///
/// # Examples
///
/// ```
/// use docs_to_markdown::url::parse_start_url;
///
/// let root = parse_start_url("https://example.com/docs#intro").unwrap();
/// assert_eq!(root.as_str(), "https://example.com/docs");
/// assert!(parse_start_url("ftp://example.com/docs").is_err());
/// ```
pub fn parse_start_url(start: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(start.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}
