//! Archive extraction.

use super::format::ArchiveFormat;
use crate::error::{MigrateError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Extract `archive` into `dest_dir`, dispatching on the file-name format.
///
/// An unknown format fails before anything is written.
pub fn extract(archive: &Path, dest_dir: &Path) -> Result<()> {
    let format = ArchiveFormat::classify(archive);
    if !format.is_supported() {
        return Err(MigrateError::UnsupportedFormat(archive.to_path_buf()));
    }

    info!("Extracting {} archive to {}", format, dest_dir.display());

    std::fs::create_dir_all(dest_dir).map_err(|e| MigrateError::Io {
        message: format!("Failed to create extract directory: {}", e),
        path: Some(dest_dir.to_path_buf()),
        source: Some(e),
    })?;

    let file = File::open(archive).map_err(|e| MigrateError::Io {
        message: format!("Failed to open archive: {}", e),
        path: Some(archive.to_path_buf()),
        source: Some(e),
    })?;

    match format {
        ArchiveFormat::Zip => extract_zip(file, archive, dest_dir),
        ArchiveFormat::TarGz => {
            let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
            extract_tar(decoder, archive, dest_dir)
        }
        ArchiveFormat::Tar => extract_tar(BufReader::new(file), archive, dest_dir),
        ArchiveFormat::Unknown => Err(MigrateError::UnsupportedFormat(archive.to_path_buf())),
    }?;

    debug!("Extraction of {} complete", archive.display());
    Ok(())
}

fn extract_zip(file: File, archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(file).map_err(|e| MigrateError::Extraction {
        archive: archive_path.to_path_buf(),
        message: format!("Invalid zip archive: {}", e),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| MigrateError::Extraction {
            archive: archive_path.to_path_buf(),
            message: format!("Failed to read zip entry {}: {}", i, e),
        })?;

        let outpath = match entry.enclosed_name() {
            Some(path) => extract_dir.join(path),
            None => {
                debug!("Skipping zip entry with unsafe name: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| MigrateError::io_with_path(e, &outpath))?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| MigrateError::io_with_path(e, parent))?;
            }

            let mut outfile =
                File::create(&outpath).map_err(|e| MigrateError::io_with_path(e, &outpath))?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| MigrateError::Extraction {
                archive: archive_path.to_path_buf(),
                message: format!("Failed to extract {}: {}", outpath.display(), e),
            })?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);

    archive
        .unpack(extract_dir)
        .map_err(|e| MigrateError::Extraction {
            archive: archive_path.to_path_buf(),
            message: format!("Failed to extract tarball: {}", e),
        })
}
