//! Template Renderer: loads `.docx` templates, substitutes placeholder tokens
//! and writes the result to disk.
//!
//! Each render opens its own copy of the template; nothing here is shared
//! between requests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub mod model;
mod package;
mod substitute;

#[cfg(test)]
pub(crate) mod fixture;

pub use model::Document;
pub use package::Package;
pub use substitute::{flatten, merge_adjacent_runs, substitute, PlaceholderMap};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("Could not write {}: {reason}", .path.display())]
    Storage { path: PathBuf, reason: String },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Package has no '{0}' part")]
    MissingPart(String),

    #[error("Malformed document body: {0}")]
    Malformed(String),
}

/// Reads and indexes a template. A missing file is reported as
/// [`RenderError::TemplateMissing`] so callers can treat it as misconfiguration.
pub async fn load_template(path: &Path) -> Result<Package, RenderError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RenderError::TemplateMissing(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let package = Package::from_bytes(bytes)?;
    debug!(
        "Loaded template {}: {} paragraph(s), {} table(s)",
        path.display(),
        package.document().paragraphs.len(),
        package.document().tables.len()
    );
    Ok(package)
}

/// Serializes the package to `directory/filename`. The directory must already
/// exist; the caller guarantees the filename is unique.
pub async fn persist(
    package: &Package,
    directory: &Path,
    filename: &str,
) -> Result<PathBuf, RenderError> {
    let path = directory.join(filename);
    let storage = |reason: String| RenderError::Storage {
        path: path.clone(),
        reason,
    };

    let bytes = package.to_bytes().map_err(|e| storage(e.to_string()))?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| storage(e.to_string()))?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}
