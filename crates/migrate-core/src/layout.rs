//! The managed path table and instance validation.
//!
//! [`ManagedPaths`] is the declarative list of folders a migration replaces.
//! Everything else inside an instance is carried over from the source
//! untouched.

use crate::config::LayoutConfig;
use crate::error::{MigrateError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Folder and file names that a migration manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPaths {
    /// Name of the asset subtree inside an instance.
    pub asset_root: String,
    /// Line-oriented config file carrying the instance name.
    pub identity_file: String,
    /// Opaque file whose presence marks a release root.
    pub package_descriptor: String,
    /// Asset folders replaced on every run.
    pub required_assets: Vec<String>,
    /// Asset folders removed if present and reinstalled only if shipped.
    pub optional_assets: Vec<String>,
    /// Instance-root folders replaced in extended-runtime mode.
    pub release_root_dirs: Vec<String>,
}

impl Default for ManagedPaths {
    fn default() -> Self {
        Self {
            asset_root: LayoutConfig::ASSET_ROOT_DIR.to_string(),
            identity_file: LayoutConfig::IDENTITY_FILE.to_string(),
            package_descriptor: LayoutConfig::PACKAGE_DESCRIPTOR.to_string(),
            required_assets: to_owned(&LayoutConfig::REQUIRED_ASSET_DIRS),
            optional_assets: to_owned(&LayoutConfig::OPTIONAL_ASSET_DIRS),
            release_root_dirs: to_owned(&LayoutConfig::RELEASE_ROOT_DIRS),
        }
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl ManagedPaths {
    /// Release-root items in processing order: folders first, then the descriptor.
    pub fn release_root_items(&self) -> Vec<&str> {
        self.release_root_dirs
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.package_descriptor.as_str()))
            .collect()
    }

    /// Required and optional asset folders, in that order.
    pub fn all_assets(&self) -> impl Iterator<Item = &str> {
        self.required_assets
            .iter()
            .chain(self.optional_assets.iter())
            .map(String::as_str)
    }

    pub fn is_optional_asset(&self, name: &str) -> bool {
        self.optional_assets.iter().any(|n| n == name)
    }
}

/// A directory validated to hold an instance.
#[derive(Debug, Clone)]
pub struct ProfileInstance {
    root: PathBuf,
    asset_root: PathBuf,
    identity_file: PathBuf,
}

impl ProfileInstance {
    /// Open an existing instance.
    ///
    /// A directory is an instance iff it has an asset-root subdirectory.
    pub fn open(root: impl AsRef<Path>, paths: &ManagedPaths) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(MigrateError::InstanceNotFound(root.to_path_buf()));
        }

        let asset_root = root.join(&paths.asset_root);
        if !asset_root.is_dir() {
            return Err(MigrateError::NotAnInstance {
                path: root.to_path_buf(),
                asset_root: paths.asset_root.clone(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            asset_root,
            identity_file: root.join(&paths.identity_file),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn identity_file(&self) -> &Path {
        &self.identity_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_table() {
        let paths = ManagedPaths::default();
        assert_eq!(paths.asset_root, ".minecraft");
        assert_eq!(paths.required_assets, vec!["config", "serverutilities", "mods"]);
        assert_eq!(paths.optional_assets, vec!["scripts", "resources"]);
        assert_eq!(
            paths.release_root_items(),
            vec!["libraries", "patches", "mmc-pack.json"]
        );
        assert!(paths.is_optional_asset("scripts"));
        assert!(!paths.is_optional_asset("mods"));
        assert_eq!(paths.all_assets().count(), 5);
    }

    #[test]
    fn test_open_valid_instance() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join(".minecraft")).unwrap();

        let instance = ProfileInstance::open(temp_dir.path(), &ManagedPaths::default()).unwrap();
        assert_eq!(instance.root(), temp_dir.path());
        assert!(instance.asset_root().ends_with(".minecraft"));
        assert!(instance.identity_file().ends_with("instance.cfg"));
    }

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = ProfileInstance::open(temp_dir.path().join("nope"), &ManagedPaths::default());
        assert!(matches!(result, Err(MigrateError::InstanceNotFound(_))));
    }

    #[test]
    fn test_open_without_asset_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("mods")).unwrap();

        let result = ProfileInstance::open(temp_dir.path(), &ManagedPaths::default());
        assert!(matches!(result, Err(MigrateError::NotAnInstance { .. })));
    }
}
