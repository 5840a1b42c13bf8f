//! Platform-specific launcher instance directories.
//!
//! The instance store is where the migrated copy is created when the operator
//! does not name one explicitly.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Candidate instance store directories, in probe order.
///
/// # Platform Behavior
/// - **Linux**: Prism (native, then Flatpak), MultiMC, PolyMC under the XDG data dir
/// - **macOS**: Prism, then MultiMC under `~/Library/Application Support`
/// - **Windows**: Prism, then MultiMC under `%APPDATA%`
pub fn store_dir_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "linux")]
    {
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("PrismLauncher").join("instances"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(
                home.join(".var")
                    .join("app")
                    .join("org.prismlauncher.PrismLauncher")
                    .join("data")
                    .join("PrismLauncher")
                    .join("instances"),
            );
        }
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("multimc").join("instances"));
            candidates.push(data.join("PolyMC").join("instances"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("PrismLauncher").join("instances"));
            candidates.push(data.join("multimc").join("instances"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(data) = dirs::data_dir() {
            candidates.push(data.join("PrismLauncher").join("instances"));
            candidates.push(data.join("MultiMC").join("instances"));
        }
    }

    candidates
}

/// Pick the instance store for a migration of `source`.
///
/// The first existing candidate wins; otherwise the source's parent directory.
pub fn detect_store_dir(source: &Path) -> PathBuf {
    first_existing(&store_dir_candidates()).unwrap_or_else(|| fallback_store_dir(source))
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|c| c.is_dir()).cloned();
    if let Some(dir) = &found {
        debug!("Detected instance store at {}", dir.display());
    }
    found
}

fn fallback_store_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidates_end_in_instances() {
        for candidate in store_dir_candidates() {
            assert!(
                candidate.ends_with("instances"),
                "Candidate should end with instances: {:?}",
                candidate
            );
        }
    }

    #[test]
    fn test_first_existing_skips_missing() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present");
        std::fs::create_dir_all(&present).unwrap();

        let candidates = vec![temp_dir.path().join("missing"), present.clone()];
        assert_eq!(first_existing(&candidates), Some(present));
        assert_eq!(first_existing(&[temp_dir.path().join("missing")]), None);
    }

    #[test]
    fn test_fallback_is_source_parent() {
        assert_eq!(
            fallback_store_dir(Path::new("/instances/Old")),
            PathBuf::from("/instances")
        );
        assert_eq!(fallback_store_dir(Path::new("Old")), PathBuf::from("."));
    }
}
