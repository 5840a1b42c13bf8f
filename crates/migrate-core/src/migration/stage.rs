//! Pipeline stages.

use serde::Serialize;

/// A state of the migration pipeline.
///
/// Stages only move forward. The two release-root stages are skipped unless
/// extended-runtime mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationStage {
    Validated,
    ArchiveReady,
    Cloned,
    AssetsStripped,
    ReleaseRootStripped,
    Extracted,
    AssetsInstalled,
    ReleaseRootInstalled,
    Renamed,
    Done,
}

impl MigrationStage {
    /// Number of announced pipeline steps.
    pub const STEP_COUNT: u8 = 8;

    /// The announced steps in order.
    pub const PIPELINE: [MigrationStage; 8] = [
        MigrationStage::ArchiveReady,
        MigrationStage::Cloned,
        MigrationStage::AssetsStripped,
        MigrationStage::ReleaseRootStripped,
        MigrationStage::Extracted,
        MigrationStage::AssetsInstalled,
        MigrationStage::ReleaseRootInstalled,
        MigrationStage::Renamed,
    ];

    /// 1-based step number; 0 for the bookend states.
    pub fn step_number(&self) -> u8 {
        match self {
            MigrationStage::Validated => 0,
            MigrationStage::ArchiveReady => 1,
            MigrationStage::Cloned => 2,
            MigrationStage::AssetsStripped => 3,
            MigrationStage::ReleaseRootStripped => 4,
            MigrationStage::Extracted => 5,
            MigrationStage::AssetsInstalled => 6,
            MigrationStage::ReleaseRootInstalled => 7,
            MigrationStage::Renamed => 8,
            MigrationStage::Done => 8,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MigrationStage::Validated => "validate inputs",
            MigrationStage::ArchiveReady => "acquire archive",
            MigrationStage::Cloned => "clone instance",
            MigrationStage::AssetsStripped => "remove stale asset folders",
            MigrationStage::ReleaseRootStripped => "remove stale release-root items",
            MigrationStage::Extracted => "extract archive",
            MigrationStage::AssetsInstalled => "install asset folders",
            MigrationStage::ReleaseRootInstalled => "install release-root items",
            MigrationStage::Renamed => "rename instance",
            MigrationStage::Done => "done",
        }
    }

    /// Whether this stage only runs in extended-runtime mode.
    pub fn is_extended_only(&self) -> bool {
        matches!(
            self,
            MigrationStage::ReleaseRootStripped | MigrationStage::ReleaseRootInstalled
        )
    }
}

impl std::fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}] {}",
            self.step_number(),
            Self::STEP_COUNT,
            self.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_is_numbered_in_order() {
        for (i, stage) in MigrationStage::PIPELINE.iter().enumerate() {
            assert_eq!(stage.step_number() as usize, i + 1);
        }
        assert_eq!(MigrationStage::PIPELINE.len(), MigrationStage::STEP_COUNT as usize);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            MigrationStage::Extracted.to_string(),
            "[5/8] extract archive"
        );
    }

    #[test]
    fn test_extended_only() {
        let extended: Vec<_> = MigrationStage::PIPELINE
            .iter()
            .filter(|s| s.is_extended_only())
            .collect();
        assert_eq!(extended.len(), 2);
    }
}
