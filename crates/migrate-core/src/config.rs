//! Centralized configuration for instance migration.
//!
//! Holds the well-known names of the instance layout, network and scratch
//! constants, and the immutable [`RunConfig`] handed to the migrator.

use crate::error::{MigrateError, Result};
use crate::layout::ManagedPaths;
use crate::platform;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Names that make up an instance on disk.
pub struct LayoutConfig;

impl LayoutConfig {
    pub const ASSET_ROOT_DIR: &'static str = ".minecraft";
    pub const IDENTITY_FILE: &'static str = "instance.cfg";
    pub const PACKAGE_DESCRIPTOR: &'static str = "mmc-pack.json";
    pub const IDENTITY_NAME_KEY: &'static str = "name";

    pub const REQUIRED_ASSET_DIRS: [&'static str; 3] = ["config", "serverutilities", "mods"];
    pub const OPTIONAL_ASSET_DIRS: [&'static str; 2] = ["scripts", "resources"];
    pub const RELEASE_ROOT_DIRS: [&'static str; 2] = ["libraries", "patches"];

    /// Children whose joint presence marks a directory as asset content.
    pub const ASSET_MARKER_DIRS: [&'static str; 2] = ["mods", "config"];
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = concat!("instance-migrate/", env!("CARGO_PKG_VERSION"));
    pub const DOWNLOAD_TEMP_SUFFIX: &'static str = ".part";
    pub const DOWNLOAD_PROGRESS_STEP_BYTES: u64 = 16 * 1024 * 1024;
}

/// Scratch area layout.
pub struct ScratchConfig;

impl ScratchConfig {
    pub const TEMP_PREFIX: &'static str = "instance-migrate-";
    pub const DOWNLOAD_DIR_NAME: &'static str = "download";
    pub const EXTRACT_DIR_NAME: &'static str = "extract";
    pub const FALLBACK_DOWNLOAD_NAME: &'static str = "download.zip";
}

/// Where the new release archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArchiveSource {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveSource::Url(url) => write!(f, "{}", url),
            ArchiveSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fully resolved settings for one migration run.
///
/// Built through [`RunConfig::builder`]; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    source: PathBuf,
    destination_name: String,
    store_dir: PathBuf,
    archive: ArchiveSource,
    extended_runtime: bool,
    dry_run: bool,
    assume_yes: bool,
    paths: ManagedPaths,
}

impl RunConfig {
    /// Start building a configuration for migrating `source` into `destination_name`.
    pub fn builder(
        source: impl Into<PathBuf>,
        destination_name: impl Into<String>,
    ) -> RunConfigBuilder {
        RunConfigBuilder::new(source, destination_name)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Resolved path of the instance this run creates.
    pub fn destination(&self) -> PathBuf {
        self.store_dir.join(&self.destination_name)
    }

    pub fn archive(&self) -> &ArchiveSource {
        &self.archive
    }

    pub fn extended_runtime(&self) -> bool {
        self.extended_runtime
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn assume_yes(&self) -> bool {
        self.assume_yes
    }

    pub fn paths(&self) -> &ManagedPaths {
        &self.paths
    }
}

/// Builder for [`RunConfig`].
///
/// # Example
///
/// ```rust,ignore
/// use instance_migrate::RunConfig;
///
/// let config = RunConfig::builder("/instances/Pack 2.6", "Pack 2.7")
///     .archive_file(Some("/downloads/pack-2.7.zip".into()))
///     .dry_run(true)
///     .build()?;
/// ```
pub struct RunConfigBuilder {
    source: PathBuf,
    destination_name: String,
    store_dir: Option<PathBuf>,
    url: Option<String>,
    archive_file: Option<PathBuf>,
    extended_runtime: bool,
    dry_run: bool,
    assume_yes: bool,
    paths: ManagedPaths,
}

impl RunConfigBuilder {
    pub fn new(source: impl Into<PathBuf>, destination_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination_name: destination_name.into(),
            store_dir: None,
            url: None,
            archive_file: None,
            extended_runtime: false,
            dry_run: false,
            assume_yes: false,
            paths: ManagedPaths::default(),
        }
    }

    /// Directory the new instance is created in.
    ///
    /// Default: the first existing launcher instance directory for this
    /// platform, else the source instance's parent directory.
    pub fn store_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.store_dir = dir;
        self
    }

    pub fn url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn archive_file(mut self, path: Option<PathBuf>) -> Self {
        self.archive_file = path;
        self
    }

    /// Also replace `libraries`, `patches` and the package descriptor.
    pub fn extended_runtime(mut self, enable: bool) -> Self {
        self.extended_runtime = enable;
        self
    }

    pub fn dry_run(mut self, enable: bool) -> Self {
        self.dry_run = enable;
        self
    }

    pub fn assume_yes(mut self, enable: bool) -> Self {
        self.assume_yes = enable;
        self
    }

    /// Override the managed path table.
    pub fn paths(mut self, paths: ManagedPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Build the configuration.
    ///
    /// Fails when the archive source is missing or ambiguous.
    pub fn build(self) -> Result<RunConfig> {
        let url = self.url.filter(|u| !u.trim().is_empty());
        let archive = match (url, self.archive_file) {
            (Some(_), Some(_)) => return Err(MigrateError::ConflictingArchiveSource),
            (Some(url), None) => ArchiveSource::Url(url.trim().to_string()),
            (None, Some(file)) => ArchiveSource::File(file),
            (None, None) => return Err(MigrateError::MissingArchiveSource),
        };

        let store_dir = match self.store_dir {
            Some(dir) => dir,
            None => platform::paths::detect_store_dir(&self.source),
        };

        Ok(RunConfig {
            source: self.source,
            destination_name: self.destination_name,
            store_dir,
            archive,
            extended_runtime: self.extended_runtime,
            dry_run: self.dry_run,
            assume_yes: self.assume_yes,
            paths: self.paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_archive_source() {
        let result = RunConfig::builder("/src", "New").build();
        assert!(matches!(result, Err(MigrateError::MissingArchiveSource)));
    }

    #[test]
    fn test_builder_rejects_both_sources() {
        let result = RunConfig::builder("/src", "New")
            .url(Some("https://example.com/pack.zip".into()))
            .archive_file(Some("/tmp/pack.zip".into()))
            .build();
        assert!(matches!(result, Err(MigrateError::ConflictingArchiveSource)));
    }

    #[test]
    fn test_blank_url_counts_as_missing() {
        let result = RunConfig::builder("/src", "New").url(Some("  ".into())).build();
        assert!(matches!(result, Err(MigrateError::MissingArchiveSource)));
    }

    #[test]
    fn test_destination_joins_store_dir() {
        let config = RunConfig::builder("/instances/Old", "New")
            .store_dir(Some("/instances".into()))
            .archive_file(Some("/tmp/pack.zip".into()))
            .build()
            .unwrap();
        assert_eq!(config.destination(), PathBuf::from("/instances/New"));
        assert_eq!(
            config.archive(),
            &ArchiveSource::File(PathBuf::from("/tmp/pack.zip"))
        );
        assert!(!config.dry_run());
        assert!(!config.extended_runtime());
    }

    #[test]
    fn test_store_dir_defaults_to_something() {
        let config = RunConfig::builder("/instances/Old", "New")
            .url(Some("https://example.com/pack.zip".into()))
            .build()
            .unwrap();
        assert!(!config.store_dir().as_os_str().is_empty());
    }
}
