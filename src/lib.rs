//! docs-to-markdown: a main-content crawler
//!
//! This crate crawls a documentation site breadth-first from a root URL,
//! picks the main content region of every page (static candidate selectors
//! first, an LLM selector oracle as fallback), converts it to Markdown and
//! compiles the per-page artifacts into one document.

pub mod config;
pub mod crawler;
pub mod output;
pub mod selector;
pub mod url;

use thiserror::Error;

/// Main error type for docs-to-markdown operations
#[derive(Debug, Error)]
pub enum DocsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] selector::OracleError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Start URL {url} could not be fetched: {reason}")]
    StartUnreachable { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for docs-to-markdown operations
pub type Result<T> = std::result::Result<T, DocsError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOptions, Crawler, Frontier};
pub use selector::{SelectorCache, SelectorResolver};
pub use url::{is_admissible, normalize_url, parse_start_url};
