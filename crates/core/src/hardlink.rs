//! Hardlinking client-held episodes into the pre-import tree.
//!
//! Linking is idempotent: a target that already is the same file as the
//! source counts as done, so a retried parse request does not fail.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tokio::fs;

/// Errors that can occur while creating a hardlink.
#[derive(Debug, Error)]
pub enum HardlinkError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// A different file already occupies the target path.
    #[error("Target already exists: {path}")]
    TargetExists { path: PathBuf },

    /// Failed to create the target's parent directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The link call itself failed.
    #[error("Failed to link {source} to {target}")]
    LinkFailed {
        source: PathBuf,
        target: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// What `link` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    /// The target already was a link to the source.
    AlreadyLinked,
}

/// Whether `part` names exactly one entry when joined onto a directory.
///
/// Empty strings, `.`, `..`, roots, prefixes and anything holding a path
/// separator are rejected, so joining a plain component never leaves the
/// directory it is joined onto.
pub fn is_plain_component(part: &str) -> bool {
    if part.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(part).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Hardlink `source` to `target`, creating missing parent directories.
pub async fn link(source: &Path, target: &Path) -> Result<LinkOutcome, HardlinkError> {
    let source_meta = fs::metadata(source)
        .await
        .map_err(|_| HardlinkError::SourceNotFound {
            path: source.to_path_buf(),
        })?;

    if let Ok(target_meta) = fs::metadata(target).await {
        return if same_file(&source_meta, &target_meta) {
            Ok(LinkOutcome::AlreadyLinked)
        } else {
            Err(HardlinkError::TargetExists {
                path: target.to_path_buf(),
            })
        };
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| HardlinkError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    fs::hard_link(source, target)
        .await
        .map_err(|e| HardlinkError::LinkFailed {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            error: e,
        })?;

    Ok(LinkOutcome::Created)
}

#[cfg(unix)]
fn same_file(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(a: &Metadata, b: &Metadata) -> bool {
    a.len() == b.len()
}
