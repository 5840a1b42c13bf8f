//! Archive container formats.

use serde::Serialize;
use std::path::Path;

/// Container format of a release archive, derived from its file name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    Tar,
    Unknown,
}

impl ArchiveFormat {
    /// Classify an archive by its suffix. No content sniffing.
    pub fn classify(path: impl AsRef<Path>) -> Self {
        let name = match path.as_ref().file_name() {
            Some(name) => name.to_string_lossy().to_lowercase(),
            None => return ArchiveFormat::Unknown,
        };

        if name.ends_with(".zip") {
            ArchiveFormat::Zip
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else if name.ends_with(".tar") {
            ArchiveFormat::Tar
        } else {
            ArchiveFormat::Unknown
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ArchiveFormat::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_suffix() {
        assert_eq!(ArchiveFormat::classify("pack-2.7.0.zip"), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::classify("/tmp/pack.tar.gz"), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::classify("pack.tgz"), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::classify("pack.tar"), ArchiveFormat::Tar);
        assert_eq!(ArchiveFormat::classify("PACK.ZIP"), ArchiveFormat::Zip);
    }

    #[test]
    fn test_unknown_formats() {
        for name in ["pack.rar", "pack.7z", "pack.tar.zst", "pack", "zip", "pack.zip.bak", ""] {
            assert_eq!(
                ArchiveFormat::classify(name),
                ArchiveFormat::Unknown,
                "{:?} should be unknown",
                name
            );
        }
        assert!(!ArchiveFormat::Unknown.is_supported());
        assert!(ArchiveFormat::Tar.is_supported());
    }

    #[test]
    fn test_classify_ignores_directories_in_path() {
        assert_eq!(ArchiveFormat::classify("/data.zip/pack.tar"), ArchiveFormat::Tar);
    }
}
