//! Error types for instance migration.
//!
//! Every failure maps onto one of a small set of categories (see [`ErrorKind`])
//! so the front end can report the violated condition and pick an exit code.

use crate::migration::MigrationStage;
use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or environment, detected before any mutation.
    Precondition,
    /// The archive could not be fetched, read, or interpreted.
    Archive,
    /// A filesystem operation failed mid-pipeline.
    Io,
}

/// Main error type for instance migration.
#[derive(Debug, Error)]
pub enum MigrateError {
    // Precondition errors
    #[error("Instance not found: {0}")]
    InstanceNotFound(PathBuf),

    #[error("Not an instance (missing {asset_root} directory): {path}")]
    NotAnInstance { path: PathBuf, asset_root: String },

    #[error("Invalid destination name {name:?}: {reason}")]
    InvalidDestinationName { name: String, reason: String },

    #[error("No archive source given: pass either a download URL or a local archive file")]
    MissingArchiveSource,

    #[error("Both a download URL and a local archive file were given; pick one")]
    ConflictingArchiveSource,

    #[error("Archive file not found: {0}")]
    ArchiveFileNotFound(PathBuf),

    #[error("Invalid download URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Instance store directory not found: {0}")]
    StoreDirNotFound(PathBuf),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Destination {destination} lies inside the source instance {instance}")]
    DestinationInsideSource { destination: PathBuf, instance: PathBuf },

    #[error("Missing capability {capability}: {message}")]
    MissingCapability { capability: String, message: String },

    // Archive errors
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to extract {archive}: {message}")]
    Extraction { archive: PathBuf, message: String },

    #[error("Could not locate {asset_root} content inside extracted archive at {root}")]
    AssetRootNotFound { root: PathBuf, asset_root: String },

    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("{} failed: {source}", stage_heading(.stage))]
    StageFailed {
        stage: MigrationStage,
        #[source]
        source: Box<MigrateError>,
    },
}

fn stage_heading(stage: &MigrationStage) -> String {
    format!(
        "Step {}/{} ({})",
        stage.step_number(),
        MigrationStage::STEP_COUNT,
        stage.label()
    )
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl MigrateError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MigrateError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Attach the pipeline stage that produced this error.
    pub fn at_stage(self, stage: MigrationStage) -> Self {
        match self {
            already @ MigrateError::StageFailed { .. } => already,
            other => MigrateError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::InstanceNotFound(_)
            | MigrateError::NotAnInstance { .. }
            | MigrateError::InvalidDestinationName { .. }
            | MigrateError::MissingArchiveSource
            | MigrateError::ConflictingArchiveSource
            | MigrateError::ArchiveFileNotFound(_)
            | MigrateError::InvalidUrl { .. }
            | MigrateError::StoreDirNotFound(_)
            | MigrateError::DestinationExists(_)
            | MigrateError::DestinationInsideSource { .. }
            | MigrateError::MissingCapability { .. } => ErrorKind::Precondition,

            MigrateError::UnsupportedFormat(_)
            | MigrateError::Extraction { .. }
            | MigrateError::AssetRootNotFound { .. }
            | MigrateError::DownloadFailed { .. } => ErrorKind::Archive,

            MigrateError::Io { .. } => ErrorKind::Io,

            MigrateError::StageFailed { source, .. } => source.kind(),
        }
    }

    /// Stage that failed, if the error came out of the pipeline.
    pub fn stage(&self) -> Option<MigrationStage> {
        match self {
            MigrateError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrateError::DestinationExists(PathBuf::from("/instances/New"));
        assert_eq!(err.to_string(), "Destination already exists: /instances/New");
    }

    #[test]
    fn test_stage_failed_names_step() {
        let err = MigrateError::UnsupportedFormat(PathBuf::from("pack.rar"))
            .at_stage(MigrationStage::Extracted);
        let msg = err.to_string();
        assert!(msg.starts_with("Step 5/8"), "unexpected message: {}", msg);
        assert!(msg.contains("pack.rar"));
        assert_eq!(err.stage(), Some(MigrationStage::Extracted));
    }

    #[test]
    fn test_kind_delegates_through_stage() {
        let err = MigrateError::DestinationExists(PathBuf::from("x"))
            .at_stage(MigrationStage::Cloned);
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = MigrateError::AssetRootNotFound {
            root: PathBuf::from("x"),
            asset_root: ".minecraft".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_at_stage_does_not_double_wrap() {
        let err = MigrateError::MissingArchiveSource
            .at_stage(MigrationStage::ArchiveReady)
            .at_stage(MigrationStage::Cloned);
        assert_eq!(err.stage(), Some(MigrationStage::ArchiveReady));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(MigrateError::MissingArchiveSource.exit_code(), 1);
    }
}
