//! Locating instance content inside an archive of unknown shape.
//!
//! Release archives are flat, nested one level, or wrapped in an extra
//! folder, and ship no manifest. Each lookup is an ordered list of pure
//! strategies over a [`ContentTree`]; the first strategy to answer wins.

use super::listing::ContentTree;
use crate::config::LayoutConfig;
use crate::error::{MigrateError, Result};
use crate::layout::ManagedPaths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A lookup tier: returns a path relative to the tree root, or nothing.
pub type LocateStrategy = fn(&dyn ContentTree, &ManagedPaths) -> Option<PathBuf>;

/// Where the archive's content lives, as absolute paths under the extraction root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveContentLocation {
    pub asset_root: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_root: Option<PathBuf>,
}

pub const ASSET_ROOT_STRATEGIES: [(&str, LocateStrategy); 3] = [
    ("named asset root", named_asset_root),
    ("root with asset markers", root_has_asset_markers),
    ("child with asset markers", child_asset_root),
];

pub const RELEASE_ROOT_STRATEGIES: [(&str, LocateStrategy); 3] = [
    ("descriptor anywhere", descriptor_parent),
    ("root with descriptor", root_has_descriptor),
    ("child with descriptor", child_has_descriptor),
];

/// Find the asset subtree inside `tree`, returned relative to its root.
pub fn locate_asset_root(tree: &dyn ContentTree, paths: &ManagedPaths) -> Result<PathBuf> {
    run_strategies(&ASSET_ROOT_STRATEGIES, tree, paths).ok_or_else(|| {
        MigrateError::AssetRootNotFound {
            root: PathBuf::new(),
            asset_root: paths.asset_root.clone(),
        }
    })
}

/// Find the release root inside `tree`, returned relative to its root.
///
/// Never fails: when nothing carries the package descriptor the tree root is
/// returned, and missing release-root items are reported individually later.
pub fn locate_release_root(tree: &dyn ContentTree, paths: &ManagedPaths) -> PathBuf {
    run_strategies(&RELEASE_ROOT_STRATEGIES, tree, paths).unwrap_or_else(|| {
        debug!(
            "No {} found in archive; using extraction root as release root",
            paths.package_descriptor
        );
        PathBuf::new()
    })
}

fn run_strategies(
    strategies: &[(&str, LocateStrategy)],
    tree: &dyn ContentTree,
    paths: &ManagedPaths,
) -> Option<PathBuf> {
    strategies.iter().find_map(|(name, strategy)| {
        let found = strategy(tree, paths);
        if let Some(path) = &found {
            debug!("Located {} via {}", path.display(), name);
        }
        found
    })
}

fn has_asset_markers(tree: &dyn ContentTree, dir: &Path) -> bool {
    LayoutConfig::ASSET_MARKER_DIRS
        .iter()
        .all(|marker| tree.is_dir(&dir.join(marker)))
}

fn named_asset_root(tree: &dyn ContentTree, paths: &ManagedPaths) -> Option<PathBuf> {
    tree.walk().into_iter().find(|p| {
        p.file_name().is_some_and(|n| n == paths.asset_root.as_str()) && tree.is_dir(p)
    })
}

fn root_has_asset_markers(tree: &dyn ContentTree, _paths: &ManagedPaths) -> Option<PathBuf> {
    has_asset_markers(tree, Path::new("")).then(PathBuf::new)
}

fn child_asset_root(tree: &dyn ContentTree, paths: &ManagedPaths) -> Option<PathBuf> {
    tree.child_dirs(Path::new("")).into_iter().find_map(|child| {
        if has_asset_markers(tree, &child) {
            return Some(child);
        }
        let nested = child.join(&paths.asset_root);
        tree.is_dir(&nested).then_some(nested)
    })
}

fn descriptor_parent(tree: &dyn ContentTree, paths: &ManagedPaths) -> Option<PathBuf> {
    tree.walk()
        .into_iter()
        .find(|p| {
            p.file_name()
                .is_some_and(|n| n == paths.package_descriptor.as_str())
                && tree.is_file(p)
        })
        .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default())
}

fn root_has_descriptor(tree: &dyn ContentTree, paths: &ManagedPaths) -> Option<PathBuf> {
    tree.is_file(Path::new(&paths.package_descriptor))
        .then(PathBuf::new)
}

fn child_has_descriptor(tree: &dyn ContentTree, paths: &ManagedPaths) -> Option<PathBuf> {
    tree.child_dirs(Path::new(""))
        .into_iter()
        .find(|child| tree.is_file(&child.join(&paths.package_descriptor)))
}
