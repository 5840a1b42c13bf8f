//! Release archive inspection.
//!
//! Provides:
//! - Container format detection from the file name
//! - Extraction of zip, tar.gz and tar archives
//! - Read-only listings of archive contents
//! - Heuristic location of asset and release-root content inside an archive

mod extract;
mod format;
mod listing;
mod locate;

pub use extract::extract;
pub use format::ArchiveFormat;
pub use listing::{ArchiveListing, ContentTree, FsTree};
pub use locate::{
    locate_asset_root, locate_release_root, ArchiveContentLocation, ASSET_ROOT_STRATEGIES,
    RELEASE_ROOT_STRATEGIES,
};
