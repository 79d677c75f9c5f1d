//! Output module for crawl artifacts and the compiled document
//!
//! This module handles:
//! - Converting the selected content of a page to Markdown
//! - Writing one Markdown artifact per crawled page
//! - Compiling the artifacts of a crawl root into one document
//! - Recording and printing crawl statistics

mod artifact;
mod compile;
mod convert;
pub mod stats;

pub use artifact::{artifact_relative_path, ArtifactWriter, ARTIFACT_EXTENSION};
pub use compile::{compile, CompileReport};
pub use convert::{
    content_to_markdown, html_to_markdown, render_content, setext_to_atx, truncate_at_marker,
};
pub use stats::{print_statistics, CrawlStats};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of compiled documents; the compiler never reads these back
pub const COMPILED_SUFFIX: &str = ".compiled.md";

/// Errors raised while writing artifacts or compiling them
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to rewrite content links: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}

/// Result type alias for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// On-disk locations that belong to one crawl root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Directory holding the root's artifacts; the compiler walks it
    pub base_dir: PathBuf,

    /// Where the compiled document is written
    pub compiled_path: PathBuf,
}

impl SiteLayout {
    /// Derives the layout of a crawl root below `output_dir`
    ///
    /// The base directory is the directory of the root's own artifact. The
    /// compiled document sits in the host directory and is named after the
    /// root's last path segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use docs_to_markdown::output::SiteLayout;
    /// use std::path::{Path, PathBuf};
    ///
    /// let layout = SiteLayout::for_root(Path::new("downloaded"), "https://www.example.com/docs");
    /// assert_eq!(layout.base_dir, PathBuf::from("downloaded/example.com"));
    /// assert_eq!(
    ///     layout.compiled_path,
    ///     PathBuf::from("downloaded/example.com/docs.compiled.md")
    /// );
    /// ```
    pub fn for_root(output_dir: &Path, root: &str) -> Self {
        let relative = artifact_relative_path(root);

        let base_dir = match relative.parent() {
            Some(parent) => output_dir.join(parent),
            None => output_dir.to_path_buf(),
        };

        let host_dir = match relative.components().next() {
            Some(host) if relative.components().count() > 1 => output_dir.join(host),
            _ => output_dir.to_path_buf(),
        };

        let stem = relative
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());

        Self {
            base_dir,
            compiled_path: host_dir.join(format!("{}{}", stem, COMPILED_SUFFIX)),
        }
    }
}
