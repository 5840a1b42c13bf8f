//! Read-only views over archive content.
//!
//! The locator works against [`ContentTree`] so the same heuristics run over
//! an extracted directory ([`FsTree`]) or over the entry names of an archive
//! that was never unpacked ([`ArchiveListing`]).
//!
//! All paths handed out are relative to the tree root, and every traversal is
//! depth-first in lexicographic order so results are reproducible.

use super::format::ArchiveFormat;
use crate::error::{MigrateError, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A directory tree the locator can probe.
pub trait ContentTree {
    /// Whether `rel` is a directory. The empty path is the root.
    fn is_dir(&self, rel: &Path) -> bool;

    /// Whether `rel` is a regular file.
    fn is_file(&self, rel: &Path) -> bool;

    /// Immediate child directories of `rel`, sorted by name.
    fn child_dirs(&self, rel: &Path) -> Vec<PathBuf>;

    /// Every entry below the root, depth-first, children sorted by name.
    fn walk(&self) -> Vec<PathBuf>;
}

/// A tree backed by a real directory.
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentTree for FsTree {
    fn is_dir(&self, rel: &Path) -> bool {
        self.root.join(rel).is_dir()
    }

    fn is_file(&self, rel: &Path) -> bool {
        self.root.join(rel).is_file()
    }

    fn child_dirs(&self, rel: &Path) -> Vec<PathBuf> {
        let dir = self.root.join(rel);
        let mut children: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| rel.join(e.file_name()))
                .collect(),
            Err(_) => Vec::new(),
        };
        children.sort();
        children
    }

    fn walk(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter_map(|e| e.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .collect()
    }
}

/// In-memory listing of an archive's entries.
#[derive(Debug, Clone, Default)]
pub struct ArchiveListing {
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
}

impl ArchiveListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the entry names of `archive` without extracting anything.
    pub fn read(archive: &Path) -> Result<Self> {
        let format = ArchiveFormat::classify(archive);
        if !format.is_supported() {
            return Err(MigrateError::UnsupportedFormat(archive.to_path_buf()));
        }

        let file = File::open(archive).map_err(|e| MigrateError::io_with_path(e, archive))?;

        match format {
            ArchiveFormat::Zip => Self::read_zip(file, archive),
            ArchiveFormat::TarGz => {
                Self::read_tar(flate2::read::GzDecoder::new(BufReader::new(file)), archive)
            }
            ArchiveFormat::Tar => Self::read_tar(BufReader::new(file), archive),
            ArchiveFormat::Unknown => Err(MigrateError::UnsupportedFormat(archive.to_path_buf())),
        }
    }

    fn read_zip(file: File, archive_path: &Path) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(file).map_err(|e| MigrateError::Extraction {
            archive: archive_path.to_path_buf(),
            message: format!("Invalid zip archive: {}", e),
        })?;

        let mut listing = Self::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| MigrateError::Extraction {
                archive: archive_path.to_path_buf(),
                message: format!("Failed to read zip entry {}: {}", i, e),
            })?;
            if let Some(path) = entry.enclosed_name() {
                if entry.is_dir() {
                    listing.insert_dir(path);
                } else {
                    listing.insert_file(path);
                }
            }
        }
        Ok(listing)
    }

    fn read_tar<R: Read>(reader: R, archive_path: &Path) -> Result<Self> {
        let to_err = |e: std::io::Error| MigrateError::Extraction {
            archive: archive_path.to_path_buf(),
            message: format!("Failed to read tarball: {}", e),
        };

        let mut archive = tar::Archive::new(reader);
        let mut listing = Self::new();
        for entry in archive.entries().map_err(to_err)? {
            let entry = entry.map_err(to_err)?;
            let path = entry.path().map_err(to_err)?.into_owned();
            if entry.header().entry_type().is_dir() {
                listing.insert_dir(path);
            } else {
                listing.insert_file(path);
            }
        }
        Ok(listing)
    }

    /// Record a directory and all its ancestors.
    pub fn insert_dir(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.dirs.insert(current.clone());
        }
    }

    /// Record a file and all its ancestor directories.
    pub fn insert_file(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        if path.as_os_str().is_empty() {
            return;
        }
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.files.insert(path);
    }

    /// Whether anything exists at `rel`.
    pub fn contains(&self, rel: &Path) -> bool {
        self.is_dir(rel) || self.is_file(rel)
    }
}

/// Drop `.` components and leading `/` so entry names compare component-wise.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

impl ContentTree for ArchiveListing {
    fn is_dir(&self, rel: &Path) -> bool {
        let rel = normalize(rel);
        rel.as_os_str().is_empty() || self.dirs.contains(&rel)
    }

    fn is_file(&self, rel: &Path) -> bool {
        self.files.contains(&normalize(rel))
    }

    fn child_dirs(&self, rel: &Path) -> Vec<PathBuf> {
        let rel = normalize(rel);
        self.dirs
            .iter()
            .filter(|d| d.parent() == Some(rel.as_path()))
            .cloned()
            .collect()
    }

    fn walk(&self) -> Vec<PathBuf> {
        // Component-wise ordering of paths is already a sorted depth-first walk.
        self.dirs.union(&self.files).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_listing_tracks_ancestors() {
        let mut listing = ArchiveListing::new();
        listing.insert_file("./pack/.minecraft/mods/a.jar");

        assert!(listing.is_dir(Path::new("pack")));
        assert!(listing.is_dir(Path::new("pack/.minecraft/mods")));
        assert!(listing.is_file(Path::new("pack/.minecraft/mods/a.jar")));
        assert!(listing.is_dir(Path::new("")));
        assert!(!listing.contains(Path::new("pack/config")));
    }

    #[test]
    fn test_listing_walk_is_depth_first_sorted() {
        let mut listing = ArchiveListing::new();
        listing.insert_file("b/x.txt");
        listing.insert_dir("a/z");
        listing.insert_dir("a/b");

        let walked: Vec<String> = listing
            .walk()
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(walked, vec!["a", "a/b", "a/z", "b", "b/x.txt"]);
    }

    #[test]
    fn test_listing_child_dirs() {
        let mut listing = ArchiveListing::new();
        listing.insert_dir("root/b");
        listing.insert_dir("root/a/deep");
        listing.insert_file("root/file.txt");

        assert_eq!(
            listing.child_dirs(Path::new("root")),
            vec![PathBuf::from("root/a"), PathBuf::from("root/b")]
        );
        assert_eq!(listing.child_dirs(Path::new("")), vec![PathBuf::from("root")]);
    }

    #[test]
    fn test_fs_tree_matches_listing_order() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("b")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("a/z")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        std::fs::write(temp_dir.path().join("b/x.txt"), "x").unwrap();

        let tree = FsTree::new(temp_dir.path());
        let walked: Vec<String> = tree
            .walk()
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(walked, vec!["a", "a/b", "a/z", "b", "b/x.txt"]);
        assert_eq!(
            tree.child_dirs(Path::new("a")),
            vec![PathBuf::from("a/b"), PathBuf::from("a/z")]
        );
        assert!(tree.is_file(Path::new("b/x.txt")));
    }

    #[test]
    fn test_read_zip_listing() {
        use std::io::Write;

        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("pack/.minecraft/config/", options).unwrap();
        writer.start_file("pack/mmc-pack.json", options).unwrap();
        writer.write_all(b"{}").unwrap();
        writer.finish().unwrap();

        let listing = ArchiveListing::read(&archive).unwrap();
        assert!(listing.is_dir(Path::new("pack/.minecraft/config")));
        assert!(listing.is_file(Path::new("pack/mmc-pack.json")));
    }

    #[test]
    fn test_read_empty_placeholder_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("pack.zip");
        std::fs::write(&archive, b"").unwrap();
        assert!(ArchiveListing::read(&archive).is_err());
    }
}
