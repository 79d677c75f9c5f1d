//! Compiles per-page artifacts into one document

use crate::output::{OutputError, OutputResult, ARTIFACT_EXTENSION, COMPILED_SUFFIX};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Separator written after every artifact
const ARTIFACT_SEPARATOR: &[u8] = b"\n\n";

/// What a compile run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub output_path: PathBuf,

    /// Artifacts included, in the order they were written
    pub artifacts: Vec<PathBuf>,

    /// Total bytes written
    pub bytes: u64,
}

/// Concatenates every artifact below `base_dir` into `output_path`
///
/// The walk is recursive. Entries are visited in file-name order and the
/// files of a directory come before its subdirectories. Each artifact is
/// followed by a blank line. Compiled documents and `output_path` itself
/// are never included. A missing `base_dir` yields an empty document.
///
/// # Arguments
///
/// * `base_dir` - Directory holding the artifacts of one crawl root
/// * `output_path` - The compiled document; truncated if it exists
///
/// # Returns
///
/// * `Ok(CompileReport)` - The document was written
/// * `Err(OutputError)` - Reading an artifact or writing the document failed
pub fn compile(base_dir: &Path, output_path: &Path) -> OutputResult<CompileReport> {
    let mut artifacts = Vec::new();
    if base_dir.is_dir() {
        collect_artifacts(base_dir, output_path, &mut artifacts)?;
    } else {
        tracing::warn!(
            "Artifact directory {} does not exist, compiled document will be empty",
            base_dir.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let io_error = |source| OutputError::Io {
        path: output_path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(output_path).map_err(io_error)?;

    let mut bytes = 0u64;
    for artifact in &artifacts {
        let content = fs::read(artifact).map_err(|source| OutputError::Io {
            path: artifact.clone(),
            source,
        })?;
        file.write_all(&content).map_err(io_error)?;
        file.write_all(ARTIFACT_SEPARATOR).map_err(io_error)?;
        bytes += (content.len() + ARTIFACT_SEPARATOR.len()) as u64;
    }
    file.flush().map_err(io_error)?;

    tracing::info!(
        "Compiled {} artifacts into {}",
        artifacts.len(),
        output_path.display()
    );

    Ok(CompileReport {
        output_path: output_path.to_path_buf(),
        artifacts,
        bytes,
    })
}

fn collect_artifacts(dir: &Path, exclude: &Path, out: &mut Vec<PathBuf>) -> OutputResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| OutputError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    let (dirs, files): (Vec<PathBuf>, Vec<PathBuf>) = paths.into_iter().partition(|p| p.is_dir());

    for file in files {
        if file == exclude {
            continue;
        }
        if is_compiled_document(&file) {
            tracing::debug!("Skipping compiled document {}", file.display());
            continue;
        }
        if file.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION) {
            out.push(file);
        }
    }
    for sub in dirs {
        collect_artifacts(&sub, exclude, out)?;
    }

    Ok(())
}

/// Compiled documents are the only files named `*.compiled.md`; artifact
/// names are escaped so they never take that form
fn is_compiled_document(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(COMPILED_SUFFIX))
}
