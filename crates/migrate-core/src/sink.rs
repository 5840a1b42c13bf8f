//! The execution sink: the single choke point for filesystem mutations.
//!
//! Every copy, removal, directory creation, file write, extraction and
//! download goes through [`ExecutionSink`]. The sink alone decides whether a
//! command really runs (`Performed`) or is only announced (`Simulated`).
//!
//! In dry-run mode the sink also keeps a journal-backed view of the
//! filesystem as it *would* look, so existence checks made by the transform
//! engine answer the same way they would in a real run without anything
//! touching disk.

use crate::archive::{self, ArchiveListing, ContentTree, FsTree};
use crate::error::{MigrateError, Result};
use crate::fsops::{self, join_rel};
use crate::network::Downloader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A mutating filesystem command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCommand {
    /// Recursive copy preserving attributes; `to` must not exist.
    CopyTree { from: PathBuf, to: PathBuf },
    /// Recursive removal; a missing path is not an error.
    RemoveTree { path: PathBuf },
    /// Create a directory and its parents.
    CreateDir { path: PathBuf },
    /// Replace a file's contents.
    WriteFile { path: PathBuf, contents: String },
    /// Unpack an archive into `dest`.
    Extract { archive: PathBuf, dest: PathBuf },
}

impl std::fmt::Display for FsCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsCommand::CopyTree { from, to } => {
                write!(f, "copy {} -> {}", from.display(), to.display())
            }
            FsCommand::RemoveTree { path } => write!(f, "remove {}", path.display()),
            FsCommand::CreateDir { path } => write!(f, "mkdir {}", path.display()),
            FsCommand::WriteFile { path, .. } => write!(f, "write {}", path.display()),
            FsCommand::Extract { archive, dest } => {
                write!(f, "extract {} -> {}", archive.display(), dest.display())
            }
        }
    }
}

/// Whether a command touched disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SinkOutcome {
    Performed,
    Simulated,
}

/// What a simulated command did to the projected filesystem.
#[derive(Debug)]
enum SimEvent {
    Mirror { from: PathBuf, to: PathBuf },
    Removed(PathBuf),
    Created { path: PathBuf, contents: Option<String> },
    /// `readable` is false when the archive's entries could not be listed.
    Extracted {
        dest: PathBuf,
        listing: ArchiveListing,
        readable: bool,
    },
}

/// What a projected path is backed by.
#[derive(Debug, PartialEq, Eq)]
enum Backing {
    Real(PathBuf),
    Written(String),
    Virtual,
    Absent,
}

/// Performs or simulates filesystem commands.
pub struct ExecutionSink {
    dry_run: bool,
    journal: Vec<String>,
    events: Vec<SimEvent>,
}

impl ExecutionSink {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            journal: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Every command issued so far, in order.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    /// Run a command, or record and announce it in dry-run mode.
    pub fn perform(&mut self, command: FsCommand) -> Result<SinkOutcome> {
        self.journal.push(command.to_string());

        if self.dry_run {
            info!("[dry-run] {}", command);
            self.simulate(command);
            return Ok(SinkOutcome::Simulated);
        }

        debug!("{}", command);
        match &command {
            FsCommand::CopyTree { from, to } => fsops::copy_tree(from, to)?,
            FsCommand::RemoveTree { path } => fsops::remove_tree(path)?,
            FsCommand::CreateDir { path } => std::fs::create_dir_all(path)
                .map_err(|e| MigrateError::io_with_path(e, path))?,
            FsCommand::WriteFile { path, contents } => std::fs::write(path, contents)
                .map_err(|e| MigrateError::io_with_path(e, path))?,
            FsCommand::Extract { archive: src, dest } => archive::extract(src, dest)?,
        }
        Ok(SinkOutcome::Performed)
    }

    /// Fetch `url` into `dest`.
    ///
    /// In dry-run mode an empty placeholder is created at `dest` instead so
    /// the rest of the pipeline still has a file to reason about.
    pub async fn fetch(
        &mut self,
        downloader: &dyn Downloader,
        url: &str,
        dest: &Path,
    ) -> Result<SinkOutcome> {
        self.journal
            .push(format!("download {} -> {}", url, dest.display()));

        if self.dry_run {
            info!("[dry-run] download {} -> {}", url, dest.display());
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MigrateError::io_with_path(e, parent))?;
            }
            std::fs::File::create(dest).map_err(|e| MigrateError::io_with_path(e, dest))?;
            return Ok(SinkOutcome::Simulated);
        }

        let bytes = downloader.download(url, dest).await?;
        debug!("Downloaded {} bytes to {}", bytes, dest.display());
        Ok(SinkOutcome::Performed)
    }

    fn simulate(&mut self, command: FsCommand) {
        let event = match command {
            FsCommand::CopyTree { from, to } => SimEvent::Mirror { from, to },
            FsCommand::RemoveTree { path } => SimEvent::Removed(path),
            FsCommand::CreateDir { path } => SimEvent::Created {
                path,
                contents: None,
            },
            FsCommand::WriteFile { path, contents } => SimEvent::Created {
                path,
                contents: Some(contents),
            },
            FsCommand::Extract { archive, dest } => {
                let (listing, readable) = match ArchiveListing::read(&archive) {
                    Ok(listing) => (listing, true),
                    Err(e) => {
                        warn!(
                            "Could not list {} for dry-run projection: {}",
                            archive.display(),
                            e
                        );
                        (ArchiveListing::new(), false)
                    }
                };
                SimEvent::Extracted {
                    dest,
                    listing,
                    readable,
                }
            }
        };
        self.events.push(event);
    }

    /// Whether `path` exists, as seen after every command issued so far.
    ///
    /// This is a read and never mutates anything.
    pub fn exists(&self, path: &Path) -> bool {
        if !self.dry_run {
            return path.symlink_metadata().is_ok();
        }
        self.resolve(path, self.events.len()) != Backing::Absent
    }

    /// Read a text file, as seen after every command issued so far.
    ///
    /// Returns `None` when the file doesn't exist or has no readable backing.
    pub fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        let backing = if self.dry_run {
            self.resolve(path, self.events.len())
        } else {
            Backing::Real(path.to_path_buf())
        };

        match backing {
            Backing::Real(real) if real.is_file() => std::fs::read_to_string(&real)
                .map(Some)
                .map_err(|e| MigrateError::io_with_path(e, real)),
            Backing::Written(contents) => Ok(Some(contents)),
            _ => Ok(None),
        }
    }

    /// A probe-able view of `dir` for the archive locator.
    pub fn content_tree(&self, dir: &Path) -> Box<dyn ContentTree> {
        if self.dry_run {
            let simulated = self.events.iter().rev().find_map(|event| match event {
                SimEvent::Extracted { dest, listing, .. } if dest == dir => Some(listing.clone()),
                _ => None,
            });
            if let Some(listing) = simulated {
                return Box::new(listing);
            }
        }
        Box::new(FsTree::new(dir))
    }

    /// Whether the content of `dir` is unknown because a simulated extraction
    /// into it could not list its archive.
    ///
    /// Always false in a real run, where the extracted directory is on disk.
    pub fn is_unlisted_extraction(&self, dir: &Path) -> bool {
        self.dry_run
            && self.events.iter().rev().find_map(|event| match event {
                SimEvent::Extracted { dest, readable, .. } if dest == dir => Some(!readable),
                _ => None,
            }) == Some(true)
    }

    /// Walk the simulated events newest first; the first one covering `path` decides.
    fn resolve(&self, path: &Path, upto: usize) -> Backing {
        for (idx, event) in self.events[..upto].iter().enumerate().rev() {
            match event {
                SimEvent::Removed(removed) => {
                    if path.starts_with(removed) {
                        return Backing::Absent;
                    }
                }
                SimEvent::Mirror { from, to } => {
                    if let Ok(rel) = path.strip_prefix(to) {
                        return self.resolve(&join_rel(from, rel), idx);
                    }
                    if to.starts_with(path) {
                        return Backing::Virtual;
                    }
                }
                SimEvent::Created {
                    path: created,
                    contents,
                } => {
                    if created == path {
                        return match contents {
                            Some(text) => Backing::Written(text.clone()),
                            None => Backing::Virtual,
                        };
                    }
                    if created.starts_with(path) {
                        return Backing::Virtual;
                    }
                }
                SimEvent::Extracted { dest, listing, .. } => {
                    if let Ok(rel) = path.strip_prefix(dest) {
                        return if rel.as_os_str().is_empty() || listing.contains(rel) {
                            Backing::Virtual
                        } else {
                            Backing::Absent
                        };
                    }
                    if dest.starts_with(path) {
                        return Backing::Virtual;
                    }
                }
            }
        }

        if path.symlink_metadata().is_ok() {
            Backing::Real(path.to_path_buf())
        } else {
            Backing::Absent
        }
    }
}
