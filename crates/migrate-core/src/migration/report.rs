//! Run summary returned by the migrator.

use super::stage::MigrationStage;
use crate::archive::ArchiveContentLocation;
use crate::config::{ArchiveSource, RunConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// What a migration run did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub destination_name: String,
    pub archive: ArchiveSource,
    pub dry_run: bool,
    pub extended_runtime: bool,
    /// Stages that ran, in order.
    pub completed: Vec<MigrationStage>,
    /// Extended-runtime stages that were not requested.
    pub skipped: Vec<MigrationStage>,
    /// Soft warnings collected along the way.
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ArchiveContentLocation>,
    /// Every sink command, in order.
    pub journal: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    pub(crate) fn new(config: &RunConfig) -> Self {
        Self {
            source: config.source().to_path_buf(),
            destination: config.destination(),
            destination_name: config.destination_name().to_string(),
            archive: config.archive().clone(),
            dry_run: config.dry_run(),
            extended_runtime: config.extended_runtime(),
            completed: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            location: None,
            journal: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub(crate) fn finish(&mut self, journal: &[String]) {
        self.completed.push(MigrationStage::Done);
        self.journal = journal.to_vec();
        self.finished_at = Some(Utc::now());
    }

    /// Whether a stage ran to completion.
    pub fn has_completed(&self, stage: MigrationStage) -> bool {
        self.completed.contains(&stage)
    }
}
