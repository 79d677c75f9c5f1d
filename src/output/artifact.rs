//! Per-page Markdown artifacts
//!
//! Every crawled page is written to a path derived from its normalized URL:
//! the host and each path segment become directories, the last segment
//! becomes the file name with a `.md` extension.

use crate::output::{OutputError, OutputResult, COMPILED_SUFFIX};
use crate::url::normalize_url;
use std::path::{Path, PathBuf};

/// Extension of per-page artifacts
pub const ARTIFACT_EXTENSION: &str = "md";

/// File name used when a URL has no path segment
const INDEX_NAME: &str = "index";

/// Characters that are not valid in file names on common platforms
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*'];

/// Derives the artifact path of a URL, relative to the output directory
///
/// # Examples
///
/// ```
/// use docs_to_markdown::output::artifact_relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     artifact_relative_path("https://www.example.com/docs/intro/"),
///     PathBuf::from("example.com/docs/intro.md")
/// );
/// assert_eq!(
///     artifact_relative_path("https://example.com/"),
///     PathBuf::from("example.com/index.md")
/// );
/// ```
pub fn artifact_relative_path(url: &str) -> PathBuf {
    let normalized = normalize_url(url);
    let mut segments: Vec<String> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(sanitize_segment)
        .collect();

    // A bare host gets an index file inside its own directory
    if segments.len() <= 1 {
        segments.push(INDEX_NAME.to_string());
    }

    let mut path: PathBuf = segments.iter().collect();
    let stem = segments.last().map(String::as_str).unwrap_or(INDEX_NAME);
    path.set_file_name(artifact_file_name(stem));
    path
}

/// File name of an artifact; never ends in the compiled-document suffix
fn artifact_file_name(stem: &str) -> String {
    let file_name = format!("{}.{}", stem, ARTIFACT_EXTENSION);
    if file_name.ends_with(COMPILED_SUFFIX) {
        format!("{}_.{}", stem, ARTIFACT_EXTENSION)
    } else {
        file_name
    }
}

/// Makes one URL segment safe to use as a file or directory name
fn sanitize_segment(segment: &str) -> String {
    let sanitized: String = segment
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match sanitized.as_str() {
        "." | ".." => sanitized.replace('.', "_"),
        _ => sanitized,
    }
}

/// Writes artifacts below an output directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The absolute artifact path of a URL
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(artifact_relative_path(url))
    }

    /// Writes `content` as the artifact of `url`, replacing any previous one
    ///
    /// Missing parent directories are created.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Where the artifact was written
    /// * `Err(OutputError)` - Directory creation or the write failed
    pub fn write(&self, url: &str, content: &str) -> OutputResult<PathBuf> {
        let path = self.path_for(url);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| OutputError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(&path, content).map_err(|source| OutputError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Wrote artifact {} for {}", path.display(), url);
        Ok(path)
    }
}
