//! Instance Migrate - Headless library for migrating launcher instances
//! to a new modpack release.
//!
//! A migration clones an existing instance, strips the content that belongs
//! to the old release, installs the content of the new release archive and
//! renames the clone. The source instance is never modified.
//!
//! # Example
//!
//! ```rust,ignore
//! use instance_migrate::{Migrator, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> instance_migrate::Result<()> {
//!     let config = RunConfig::builder("/path/to/instances/GTNH 2.6.1", "GTNH 2.7.0")
//!         .archive_file(Some("/downloads/GTNH-2.7.0.zip".into()))
//!         .dry_run(true)
//!         .build()?;
//!
//!     let report = Migrator::new(config).run().await?;
//!     for line in &report.journal {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod identity;
pub mod layout;
pub mod migration;
pub mod network;
pub mod platform;
pub mod preflight;
pub mod sink;
pub mod transform;

mod fsops;

// Re-export commonly used types
pub use archive::{ArchiveContentLocation, ArchiveFormat};
pub use config::{ArchiveSource, RunConfig, RunConfigBuilder};
pub use error::{ErrorKind, MigrateError, Result};
pub use layout::{ManagedPaths, ProfileInstance};
pub use migration::{MigrationReport, MigrationStage, Migrator};
pub use network::{Downloader, HttpDownloader};
pub use sink::{ExecutionSink, FsCommand, SinkOutcome};
