//! Filesystem primitives executed by the [`ExecutionSink`](crate::sink::ExecutionSink).
//!
//! Nothing outside the sink should call these directly.

use crate::error::{MigrateError, Result};
use std::fs::{self, FileTimes};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Recursively copy `src` to `dst`, preserving permissions and modification times.
///
/// `dst` must not exist yet. `src` may be a file or a directory.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if dst.symlink_metadata().is_ok() {
        return Err(MigrateError::Io {
            message: "Copy destination already exists".to_string(),
            path: Some(dst.to_path_buf()),
            source: Some(std::io::Error::from(std::io::ErrorKind::AlreadyExists)),
        });
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| MigrateError::io_with_path(e, parent))?;
    }

    if !src.is_dir() {
        return copy_file(src, dst);
    }

    // Directory attributes are applied after their contents, deepest first,
    // so writing children doesn't bump the parent's mtime afterwards.
    let mut dirs = Vec::new();

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| MigrateError::Io {
            message: format!("Failed to walk directory: {}", e),
            path: e.path().map(Path::to_path_buf),
            source: e.into_io_error(),
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| MigrateError::Io {
                message: e.to_string(),
                path: Some(entry.path().to_path_buf()),
                source: None,
            })?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&target).map_err(|e| MigrateError::io_with_path(e, &target))?;
            dirs.push((entry.path().to_path_buf(), target));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    for (source_dir, target_dir) in dirs.iter().rev() {
        copy_attributes(source_dir, target_dir)?;
    }

    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    // fs::copy carries permission bits over.
    fs::copy(src, dst).map_err(|e| MigrateError::Io {
        message: format!("Failed to copy file: {}", e),
        path: Some(src.to_path_buf()),
        source: Some(e),
    })?;
    copy_times(src, dst)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| MigrateError::io_with_path(e, src))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| MigrateError::io_with_path(e, dst))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_tree(src, dst)
    } else {
        copy_file(src, dst)
    }
}

fn copy_attributes(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::metadata(src).map_err(|e| MigrateError::io_with_path(e, src))?;
    fs::set_permissions(dst, metadata.permissions())
        .map_err(|e| MigrateError::io_with_path(e, dst))?;
    copy_times(src, dst)
}

fn copy_times(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::metadata(src).map_err(|e| MigrateError::io_with_path(e, src))?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }

    // Read-only files can't be opened for writing; their times are best effort.
    match fs::File::options().write(true).open(dst) {
        Ok(file) => file
            .set_times(times)
            .map_err(|e| MigrateError::io_with_path(e, dst)),
        Err(_) => match fs::File::open(dst) {
            Ok(file) => {
                file.set_times(times).ok();
                Ok(())
            }
            Err(e) => {
                debug!("Could not carry timestamps over to {}: {}", dst.display(), e);
                Ok(())
            }
        },
    }
}

/// Remove a file or directory tree. A missing path is not an error.
pub fn remove_tree(path: &Path) -> Result<()> {
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(MigrateError::io_with_path(e, path)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| MigrateError::Io {
        message: format!("Failed to remove: {}", e),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })
}

/// Join a possibly empty relative path onto `base` without a trailing separator.
pub(crate) fn join_rel(base: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_copies_nested_content() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        std::fs::create_dir_all(src.join("a/b")).unwrap();
        std::fs::create_dir_all(src.join("empty")).unwrap();
        std::fs::write(src.join("a/b/file.txt"), "hello").unwrap();

        let dst = temp_dir.path().join("out/dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(dst.join("a/b/file.txt")).unwrap(), "hello");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_tree_preserves_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("file.txt");
        std::fs::write(&src, "x").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        std::fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let dst = temp_dir.path().join("copy.txt");
        copy_tree(&src, &dst).unwrap();
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn test_copy_tree_refuses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dst).unwrap();

        assert!(copy_tree(&src, &dst).is_err());
    }

    #[test]
    fn test_remove_tree() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dir");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("nested/f"), "x").unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        remove_tree(&dir).unwrap();
        remove_tree(&file).unwrap();
        assert!(!dir.exists());
        assert!(!file.exists());

        // Missing paths are fine.
        remove_tree(&temp_dir.path().join("missing")).unwrap();
    }
}
