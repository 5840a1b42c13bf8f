//! Scratch area for downloads and extraction.

use crate::config::ScratchConfig;
use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A temporary directory owned by one run, removed when dropped.
///
/// Removal failures are logged and otherwise ignored; they never change the
/// outcome of the run.
pub struct ScratchArea {
    dir: Option<TempDir>,
}

impl ScratchArea {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(ScratchConfig::TEMP_PREFIX)
            .tempdir()
            .map_err(|e| MigrateError::Io {
                message: format!("Failed to create scratch directory: {}", e),
                path: Some(std::env::temp_dir()),
                source: Some(e),
            })?;
        debug!("Scratch area at {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        self.dir.as_ref().map(TempDir::path).unwrap_or(Path::new(""))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.path().join(ScratchConfig::DOWNLOAD_DIR_NAME)
    }

    pub fn extract_dir(&self) -> PathBuf {
        self.path().join(ScratchConfig::EXTRACT_DIR_NAME)
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed scratch area {}", path.display()),
                Err(e) => warn!("Failed to remove scratch area {}: {}", path.display(), e),
            }
        }
    }
}
