//! The transform engine: remove and install managed paths.
//!
//! These functions decide *what* to touch from the [`ManagedPaths`] table.
//! Whether anything actually changes on disk is up to the sink.

use crate::error::Result;
use crate::layout::ManagedPaths;
use crate::sink::{ExecutionSink, FsCommand};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// What one transform step did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutcome {
    /// Managed names a command was issued for.
    pub applied: Vec<String>,
    /// Soft warnings; none of these fail the run.
    pub warnings: Vec<String>,
}

impl TransformOutcome {
    fn applied(&mut self, name: &str) {
        self.applied.push(name.to_string());
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Strip stale asset folders from an instance's asset root.
///
/// Required folders are always removed; optional ones only when present.
pub fn remove_asset_folders(
    sink: &mut ExecutionSink,
    paths: &ManagedPaths,
    asset_root: &Path,
) -> Result<TransformOutcome> {
    let mut outcome = TransformOutcome::default();

    for name in &paths.required_assets {
        sink.perform(FsCommand::RemoveTree {
            path: asset_root.join(name),
        })?;
        outcome.applied(name);
    }

    for name in &paths.optional_assets {
        let target = asset_root.join(name);
        if sink.exists(&target) {
            sink.perform(FsCommand::RemoveTree { path: target })?;
            outcome.applied(name);
        } else {
            debug!("Optional folder {} not present, skipping", name);
        }
    }

    Ok(outcome)
}

/// Strip stale release-root items from an instance root.
pub fn remove_release_root_items(
    sink: &mut ExecutionSink,
    paths: &ManagedPaths,
    target_root: &Path,
) -> Result<TransformOutcome> {
    let mut outcome = TransformOutcome::default();

    for name in paths.release_root_items() {
        let target = target_root.join(name);
        if sink.exists(&target) {
            sink.perform(FsCommand::RemoveTree { path: target })?;
            outcome.applied(name);
        } else {
            outcome.warn(format!("{} not found in instance, skipping removal", name));
        }
    }

    Ok(outcome)
}

/// Copy every managed asset folder the archive ships into the instance.
pub fn install_asset_folders(
    sink: &mut ExecutionSink,
    paths: &ManagedPaths,
    source_asset_root: &Path,
    dest_asset_root: &Path,
) -> Result<TransformOutcome> {
    let mut outcome = TransformOutcome::default();

    for name in paths.all_assets() {
        let from = source_asset_root.join(name);
        if !sink.exists(&from) {
            if paths.is_optional_asset(name) {
                debug!("Optional folder {} not in archive, skipping", name);
            } else {
                outcome.warn(format!("{} not found in archive, skipping", name));
            }
            continue;
        }

        sink.perform(FsCommand::CopyTree {
            from,
            to: dest_asset_root.join(name),
        })?;
        outcome.applied(name);
    }

    Ok(outcome)
}

/// Copy every release-root item the archive ships into the instance root.
pub fn install_release_root_items(
    sink: &mut ExecutionSink,
    paths: &ManagedPaths,
    source_release_root: &Path,
    dest_root: &Path,
) -> Result<TransformOutcome> {
    let mut outcome = TransformOutcome::default();

    for name in paths.release_root_items() {
        let from = source_release_root.join(name);
        if !sink.exists(&from) {
            outcome.warn(format!("{} not found in archive, skipping", name));
            continue;
        }

        sink.perform(FsCommand::CopyTree {
            from,
            to: dest_root.join(name),
        })?;
        outcome.applied(name);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn instance_with(dirs: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for dir in dirs {
            std::fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
            std::fs::write(temp_dir.path().join(dir).join("marker"), dir).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_remove_asset_folders() {
        let temp_dir = instance_with(&[
            ".minecraft/mods",
            ".minecraft/config",
            ".minecraft/scripts",
            ".minecraft/saves",
        ]);
        let asset_root = temp_dir.path().join(".minecraft");
        let mut sink = ExecutionSink::new(false);

        let outcome =
            remove_asset_folders(&mut sink, &ManagedPaths::default(), &asset_root).unwrap();

        assert_eq!(outcome.applied, vec!["config", "serverutilities", "mods", "scripts"]);
        assert!(outcome.warnings.is_empty());
        assert!(!asset_root.join("mods").exists());
        assert!(!asset_root.join("scripts").exists());
        assert!(asset_root.join("saves").exists());
    }

    #[test]
    fn test_remove_release_root_items_warns_on_missing() {
        let temp_dir = instance_with(&["libraries"]);
        let mut sink = ExecutionSink::new(false);

        let outcome =
            remove_release_root_items(&mut sink, &ManagedPaths::default(), temp_dir.path())
                .unwrap();

        assert_eq!(outcome.applied, vec!["libraries"]);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(!temp_dir.path().join("libraries").exists());
    }

    #[test]
    fn test_install_asset_folders_skips_missing() {
        let archive = instance_with(&[
            "pack/.minecraft/mods",
            "pack/.minecraft/config",
            "pack/.minecraft/resources",
        ]);
        let instance = instance_with(&[".minecraft"]);
        let mut sink = ExecutionSink::new(false);

        let outcome = install_asset_folders(
            &mut sink,
            &ManagedPaths::default(),
            &archive.path().join("pack/.minecraft"),
            &instance.path().join(".minecraft"),
        )
        .unwrap();

        assert_eq!(outcome.applied, vec!["config", "mods", "resources"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("serverutilities"));
        assert_eq!(
            std::fs::read_to_string(instance.path().join(".minecraft/mods/marker")).unwrap(),
            "pack/.minecraft/mods"
        );
    }

    #[test]
    fn test_dry_run_projection_mirrors_real_decisions() {
        let temp_dir = instance_with(&[".minecraft/mods", ".minecraft/resources"]);
        let asset_root = temp_dir.path().join(".minecraft");
        let mut sink = ExecutionSink::new(true);

        let outcome =
            remove_asset_folders(&mut sink, &ManagedPaths::default(), &asset_root).unwrap();

        // Optional folders follow the projected state, not a blanket removal.
        assert_eq!(outcome.applied, vec!["config", "serverutilities", "mods", "resources"]);
        assert!(asset_root.join("mods").exists());
        assert!(asset_root.join("resources").exists());
        assert_eq!(sink.journal().len(), 4);
    }
}
