//! On-disk layout of the served directories.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
#[error("failed to prepare directory {path:?}: {source}")]
pub struct LayoutError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// The data and uploads roots, created and ready to serve.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

impl DirectoryLayout {
    /// Create both roots (and missing parents) with owner-only permissions.
    pub fn prepare(config: &StorageConfig) -> Result<Self, LayoutError> {
        let data_dir = config.data_dir.clone();
        let uploads_dir = config.uploads_dir();

        create_private_dir(&data_dir)?;
        create_private_dir(&uploads_dir)?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            uploads_dir = %uploads_dir.display(),
            "Storage directories ready"
        );

        Ok(Self {
            data_dir,
            uploads_dir,
        })
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> Result<(), LayoutError> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(path)
        .map_err(|source| LayoutError {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> Result<(), LayoutError> {
    std::fs::create_dir_all(path).map_err(|source| LayoutError {
        path: path.to_path_buf(),
        source,
    })
}
