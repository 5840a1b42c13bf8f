//! Input validation and capability checks.
//!
//! Everything here only reads. A run that fails preflight has created
//! nothing on disk.

use crate::config::{ArchiveSource, RunConfig};
use crate::error::{MigrateError, Result};
use crate::layout::ProfileInstance;
use crate::network::Downloader;
use std::path::Component;
use std::path::Path;
use tracing::debug;

/// Validate a run configuration and return the opened source instance.
pub fn validate(config: &RunConfig, downloader: &dyn Downloader) -> Result<ProfileInstance> {
    let instance = ProfileInstance::open(config.source(), config.paths())?;
    validate_destination_name(config.destination_name())?;

    if !config.store_dir().is_dir() {
        return Err(MigrateError::StoreDirNotFound(config.store_dir().to_path_buf()));
    }

    let destination = config.destination();
    if destination.symlink_metadata().is_ok() {
        return Err(MigrateError::DestinationExists(destination));
    }
    ensure_outside_source(&instance, config)?;

    match config.archive() {
        ArchiveSource::File(path) => validate_archive_file(path)?,
        ArchiveSource::Url(url) => {
            validate_url(url)?;
            downloader.probe()?;
        }
    }

    debug!(
        "Preflight passed for {} -> {}",
        instance.root().display(),
        destination.display()
    );
    Ok(instance)
}

/// A destination name must be a single, plain path component.
pub fn validate_destination_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| MigrateError::InvalidDestinationName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name must not contain path separators"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("name must be a plain directory name")),
    }
}

/// The clone must not land anywhere under the source instance.
fn ensure_outside_source(instance: &ProfileInstance, config: &RunConfig) -> Result<()> {
    let source = instance
        .root()
        .canonicalize()
        .map_err(|e| MigrateError::io_with_path(e, instance.root()))?;
    let store_dir = config
        .store_dir()
        .canonicalize()
        .map_err(|e| MigrateError::io_with_path(e, config.store_dir()))?;
    let destination = store_dir.join(config.destination_name());

    if destination.starts_with(&source) {
        return Err(MigrateError::DestinationInsideSource {
            destination,
            instance: source,
        });
    }
    Ok(())
}

fn validate_archive_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(MigrateError::ArchiveFileNotFound(path.to_path_buf()));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| MigrateError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(MigrateError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HttpDownloader;
    use tempfile::TempDir;

    fn instance_in(temp_dir: &TempDir) -> std::path::PathBuf {
        let source = temp_dir.path().join("instances/Old");
        std::fs::create_dir_all(source.join(".minecraft/mods")).unwrap();
        std::fs::write(source.join("instance.cfg"), "name=Old\n").unwrap();
        let archive = temp_dir.path().join("pack.zip");
        std::fs::write(&archive, b"").unwrap();
        source
    }

    #[test]
    fn test_rejects_destination_inside_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = instance_in(&temp_dir);

        for store in [source.clone(), source.join(".minecraft")] {
            let config = RunConfig::builder(&source, "New")
                .store_dir(Some(store))
                .archive_file(Some(temp_dir.path().join("pack.zip")))
                .build()
                .unwrap();
            let err = validate(&config, &HttpDownloader::new()).unwrap_err();
            assert!(
                matches!(err, MigrateError::DestinationInsideSource { .. }),
                "unexpected error: {}",
                err
            );
            assert_eq!(err.kind(), crate::error::ErrorKind::Precondition);
        }
        assert!(!source.join("New").exists());
    }

    #[test]
    fn test_sibling_destination_passes() {
        let temp_dir = TempDir::new().unwrap();
        let source = instance_in(&temp_dir);

        // A sibling whose name shares the source's prefix is still outside it.
        let config = RunConfig::builder(&source, "Old-2")
            .store_dir(Some(temp_dir.path().join("instances")))
            .archive_file(Some(temp_dir.path().join("pack.zip")))
            .build()
            .unwrap();
        let instance = validate(&config, &HttpDownloader::new()).unwrap();
        assert_eq!(instance.root(), source.as_path());
    }

    #[test]
    fn test_destination_names() {
        assert!(validate_destination_name("GT New Horizons 2.7.0").is_ok());
        for bad in ["", "   ", ".", "..", "a/b", "a\\b"] {
            assert!(
                matches!(
                    validate_destination_name(bad),
                    Err(MigrateError::InvalidDestinationName { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_urls() {
        assert!(validate_url("https://example.com/pack.zip").is_ok());
        assert!(validate_url("http://example.com/pack.zip").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/pack.zip"),
            Err(MigrateError::InvalidUrl { .. })
        ));
        assert!(validate_url("pack.zip").is_err());
    }
}
