//! The migration pipeline.
//!
//! A run walks a fixed sequence of stages:
//!
//! 1. acquire the archive (download or local file)
//! 2. clone the source instance to the destination
//! 3. remove stale asset folders from the clone
//! 4. remove stale release-root items (extended-runtime only)
//! 5. extract the archive and locate its content
//! 6. install asset folders from the archive
//! 7. install release-root items (extended-runtime only)
//! 8. rewrite the clone's name
//!
//! Validation runs first and creates nothing. From step 2 on every change
//! lands in the clone; the source instance is only ever read.

mod report;
mod scratch;
mod stage;

pub use report::MigrationReport;
pub use scratch::ScratchArea;
pub use stage::MigrationStage;

use crate::archive::{
    locate_asset_root, locate_release_root, ArchiveContentLocation, ArchiveFormat,
};
use crate::config::{ArchiveSource, RunConfig};
use crate::error::{MigrateError, Result};
use crate::fsops::join_rel;
use crate::identity;
use crate::layout::ProfileInstance;
use crate::network::{download_file_name, Downloader, HttpDownloader};
use crate::sink::{ExecutionSink, FsCommand, SinkOutcome};
use crate::transform::{self, TransformOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runs one migration described by a [`RunConfig`].
pub struct Migrator {
    config: RunConfig,
    downloader: Arc<dyn Downloader>,
}

impl Migrator {
    /// Create a migrator that downloads over HTTP.
    pub fn new(config: RunConfig) -> Self {
        Self::with_downloader(config, Arc::new(HttpDownloader::new()))
    }

    /// Create a migrator with a custom downloader.
    pub fn with_downloader(config: RunConfig, downloader: Arc<dyn Downloader>) -> Self {
        Self { config, downloader }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Check every precondition without touching disk.
    pub fn validate(&self) -> Result<ProfileInstance> {
        crate::preflight::validate(&self.config, self.downloader.as_ref())
    }

    /// Validate, then run all pipeline stages.
    ///
    /// On failure after the clone step the partially migrated destination is
    /// left in place; the error names the failing stage.
    pub async fn run(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::new(&self.config);

        let instance = self.validate()?;
        info!(
            "Migrating {} -> {}{}",
            instance.root().display(),
            report.destination.display(),
            if self.config.dry_run() { " (dry run)" } else { "" }
        );
        report.completed.push(MigrationStage::Validated);

        let scratch = ScratchArea::new()?;
        let mut sink = ExecutionSink::new(self.config.dry_run());

        let paths = self.config.paths();
        let destination = self.config.destination();
        let dest_asset_root = destination.join(&paths.asset_root);

        // 1
        let stage = self.enter(MigrationStage::ArchiveReady);
        let archive = self
            .acquire_archive(&mut sink, &scratch)
            .await
            .map_err(|e| e.at_stage(stage))?;
        report.completed.push(stage);

        // 2
        let stage = self.enter(MigrationStage::Cloned);
        self.clone_instance(&mut sink, &instance, &destination)
            .map_err(|e| e.at_stage(stage))?;
        report.completed.push(stage);

        // 3
        let stage = self.enter(MigrationStage::AssetsStripped);
        let outcome = transform::remove_asset_folders(&mut sink, paths, &dest_asset_root)
            .map_err(|e| e.at_stage(stage))?;
        absorb(&mut report, stage, outcome);

        // 4
        let stage = self.enter_extended(MigrationStage::ReleaseRootStripped, &mut report);
        if let Some(stage) = stage {
            let outcome = transform::remove_release_root_items(&mut sink, paths, &destination)
                .map_err(|e| e.at_stage(stage))?;
            absorb(&mut report, stage, outcome);
        }

        // 5
        let stage = self.enter(MigrationStage::Extracted);
        let location = self
            .extract_and_locate(&mut sink, &scratch, &archive, &mut report)
            .map_err(|e| e.at_stage(stage))?;
        report.location = Some(location.clone());
        report.completed.push(stage);

        // 6
        let stage = self.enter(MigrationStage::AssetsInstalled);
        let outcome = transform::install_asset_folders(
            &mut sink,
            paths,
            &location.asset_root,
            &dest_asset_root,
        )
        .map_err(|e| e.at_stage(stage))?;
        absorb(&mut report, stage, outcome);

        // 7
        let stage = self.enter_extended(MigrationStage::ReleaseRootInstalled, &mut report);
        if let Some(stage) = stage {
            let release_root = location
                .release_root
                .clone()
                .unwrap_or_else(|| scratch.extract_dir());
            let outcome = transform::install_release_root_items(
                &mut sink,
                paths,
                &release_root,
                &destination,
            )
            .map_err(|e| e.at_stage(stage))?;
            absorb(&mut report, stage, outcome);
        }

        // 8
        let stage = self.enter(MigrationStage::Renamed);
        self.rename_instance(&mut sink, &destination)
            .map_err(|e| e.at_stage(stage))?;
        report.completed.push(stage);

        report.finish(sink.journal());
        info!(
            "Migration {} {}",
            if self.config.dry_run() { "simulated for" } else { "complete:" },
            destination.display()
        );
        Ok(report)
    }

    fn enter(&self, stage: MigrationStage) -> MigrationStage {
        info!("{}", stage);
        stage
    }

    fn enter_extended(
        &self,
        stage: MigrationStage,
        report: &mut MigrationReport,
    ) -> Option<MigrationStage> {
        if self.config.extended_runtime() {
            Some(self.enter(stage))
        } else {
            info!("{} (skipped, extended runtime not requested)", stage);
            report.skipped.push(stage);
            None
        }
    }

    async fn acquire_archive(
        &self,
        sink: &mut ExecutionSink,
        scratch: &ScratchArea,
    ) -> Result<PathBuf> {
        match self.config.archive() {
            ArchiveSource::File(path) => {
                info!("Using local archive {}", path.display());
                Ok(path.clone())
            }
            ArchiveSource::Url(url) => {
                let dest = scratch.download_dir().join(download_file_name(url));
                sink.fetch(self.downloader.as_ref(), url, &dest).await?;
                Ok(dest)
            }
        }
    }

    fn clone_instance(
        &self,
        sink: &mut ExecutionSink,
        instance: &ProfileInstance,
        destination: &Path,
    ) -> Result<()> {
        if sink.exists(destination) {
            return Err(MigrateError::DestinationExists(destination.to_path_buf()));
        }

        sink.perform(FsCommand::CopyTree {
            from: instance.root().to_path_buf(),
            to: destination.to_path_buf(),
        })
        .map_err(|e| match e {
            MigrateError::Io {
                source: Some(io), ..
            } if io.kind() == std::io::ErrorKind::AlreadyExists => {
                MigrateError::DestinationExists(destination.to_path_buf())
            }
            other => other,
        })?;
        Ok(())
    }

    fn extract_and_locate(
        &self,
        sink: &mut ExecutionSink,
        scratch: &ScratchArea,
        archive: &Path,
        report: &mut MigrationReport,
    ) -> Result<ArchiveContentLocation> {
        let format = ArchiveFormat::classify(archive);
        if !format.is_supported() {
            return Err(MigrateError::UnsupportedFormat(archive.to_path_buf()));
        }

        let paths = self.config.paths();
        let extract_dir = scratch.extract_dir();
        sink.perform(FsCommand::CreateDir {
            path: extract_dir.clone(),
        })?;
        let outcome = sink.perform(FsCommand::Extract {
            archive: archive.to_path_buf(),
            dest: extract_dir.clone(),
        })?;

        let tree = sink.content_tree(&extract_dir);
        let unlisted =
            outcome == SinkOutcome::Simulated && sink.is_unlisted_extraction(&extract_dir);
        let asset_rel = match locate_asset_root(tree.as_ref(), paths) {
            Ok(rel) => rel,
            Err(_) if unlisted => {
                report.warn(format!(
                    "Archive content could not be inspected; assuming {} at the archive root",
                    paths.asset_root
                ));
                PathBuf::from(&paths.asset_root)
            }
            Err(_) => {
                return Err(MigrateError::AssetRootNotFound {
                    root: extract_dir,
                    asset_root: paths.asset_root.clone(),
                })
            }
        };

        let release_root = self
            .config
            .extended_runtime()
            .then(|| join_rel(&extract_dir, &locate_release_root(tree.as_ref(), paths)));

        let location = ArchiveContentLocation {
            asset_root: join_rel(&extract_dir, &asset_rel),
            release_root,
        };
        info!("Archive content located at {}", location.asset_root.display());
        Ok(location)
    }

    fn rename_instance(&self, sink: &mut ExecutionSink, destination: &Path) -> Result<()> {
        let identity_path = destination.join(&self.config.paths().identity_file);
        let current = sink.read_to_string(&identity_path)?.unwrap_or_default();
        let updated = identity::rewrite_name(&current, self.config.destination_name());

        sink.perform(FsCommand::WriteFile {
            path: identity_path,
            contents: updated,
        })?;
        Ok(())
    }
}

fn absorb(report: &mut MigrationReport, stage: MigrationStage, outcome: TransformOutcome) {
    report.warnings.extend(outcome.warnings);
    report.completed.push(stage);
}
