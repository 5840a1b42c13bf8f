//! Single-shot archive downloads.
//!
//! Downloads stream into a `.part` file next to the destination and are
//! renamed into place once complete. Failures are reported once; there are
//! no automatic retries.

use crate::config::{NetworkConfig, ScratchConfig};
use crate::error::{MigrateError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fetches a URL to a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Check that this downloader can run at all.
    fn probe(&self) -> Result<()>;

    /// Fetch `url` to `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Downloader backed by a reqwest client.
pub struct HttpDownloader {
    client: Option<reqwest::Client>,
    build_error: Option<String>,
}

impl HttpDownloader {
    /// Create a new downloader.
    ///
    /// Client construction errors are deferred to [`Downloader::probe`] so
    /// they surface during validation.
    pub fn new() -> Self {
        match reqwest::Client::builder()
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
        {
            Ok(client) => Self {
                client: Some(client),
                build_error: None,
            },
            Err(e) => Self {
                client: None,
                build_error: Some(e.to_string()),
            },
        }
    }

    fn client(&self) -> Result<&reqwest::Client> {
        self.client.as_ref().ok_or_else(|| MigrateError::MissingCapability {
            capability: "http client".to_string(),
            message: self
                .build_error
                .clone()
                .unwrap_or_else(|| "unavailable".to_string()),
        })
    }

    async fn do_download(&self, url: &str, temp_path: &Path) -> Result<u64> {
        let response = self
            .client()?
            .get(url)
            .send()
            .await
            .map_err(|e| MigrateError::DownloadFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::DownloadFailed {
                url: url.to_string(),
                message: format!("Download failed with status {}", status),
            });
        }

        let total_size = response.content_length();
        let mut file = tokio::fs::File::create(temp_path).await.map_err(|e| MigrateError::Io {
            message: format!("Failed to create download file: {}", e),
            path: Some(temp_path.to_path_buf()),
            source: Some(e),
        })?;

        let mut downloaded: u64 = 0;
        let mut next_report = NetworkConfig::DOWNLOAD_PROGRESS_STEP_BYTES;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MigrateError::DownloadFailed {
                url: url.to_string(),
                message: format!("Error reading download chunk: {}", e),
            })?;

            file.write_all(&chunk).await.map_err(|e| MigrateError::Io {
                message: format!("Failed to write download: {}", e),
                path: Some(temp_path.to_path_buf()),
                source: Some(e),
            })?;

            downloaded += chunk.len() as u64;
            if downloaded >= next_report {
                match total_size {
                    Some(total) if total > 0 => debug!(
                        "Downloaded {} / {} bytes ({:.0}%)",
                        downloaded,
                        total,
                        downloaded as f64 / total as f64 * 100.0
                    ),
                    _ => debug!("Downloaded {} bytes", downloaded),
                }
                next_report += NetworkConfig::DOWNLOAD_PROGRESS_STEP_BYTES;
            }
        }

        file.flush()
            .await
            .map_err(|e| MigrateError::io_with_path(e, temp_path))?;
        Ok(downloaded)
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn probe(&self) -> Result<()> {
        self.client().map(|_| ())
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading archive from {}", url);

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MigrateError::io_with_path(e, parent))?;
        }

        let temp_path = PathBuf::from(format!(
            "{}{}",
            dest.display(),
            NetworkConfig::DOWNLOAD_TEMP_SUFFIX
        ));

        match self.do_download(url, &temp_path).await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::rename(&temp_path, dest).await {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    return Err(MigrateError::Io {
                        message: format!("Failed to move download into place: {}", e),
                        path: Some(dest.to_path_buf()),
                        source: Some(e),
                    });
                }
                info!("Download complete: {} bytes", bytes);
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }
}

/// File name to store a download under: the URL's last path segment.
///
/// Falls back to a generic zip name when the URL has no usable segment.
pub fn download_file_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| ScratchConfig::FALLBACK_DOWNLOAD_NAME.to_string())
}
