/*!
 * Gateway fetcher for video media.
 *
 * Downloads a video's media from an ordered list of content gateways.
 * Legacy videos are one direct download; embed videos are HLS collections
 * whose manifest names the segments to concatenate. Gateways are tried
 * strictly sequentially; the final gateway additionally gets a bounded
 * number of retries with exponential backoff. Downloaded files live in a
 * scoped temp directory and are wrapped in a [`MediaFile`] guard that
 * removes them on drop, so the file is gone on every exit path.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::app_config::FetchConfig;
use crate::errors::{CleanupError, FetchError};

/// Downloaded media held in a temp directory.
///
/// Dropping the guard deletes the file. Deletion failure is logged and
/// never escalated.
#[derive(Debug)]
pub struct MediaFile {
    path: PathBuf,
    size_bytes: u64,
}

impl MediaFile {
    /// Path to the downloaded file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Downloaded size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl Drop for MediaFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                let cleanup = CleanupError::RemoveFailed {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                };
                warn!("{}", cleanup);
            } else {
                debug!("Removed temp media file {}", self.path.display());
            }
        }
    }
}

/// Fetches media from an ordered set of gateways.
#[derive(Debug)]
pub struct GatewayFetcher {
    client: reqwest::Client,
    gateways: Vec<String>,
    timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
    temp_dir: PathBuf,
    // Owns the scoped directory; removed when the fetcher is dropped
    _temp_dir_guard: tempfile::TempDir,
}

impl GatewayFetcher {
    /// Create a fetcher from config, with a fresh scoped temp directory
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let temp_dir_guard = tempfile::Builder::new().prefix("polysub-media-").tempdir()?;
        let temp_dir = temp_dir_guard.path().to_path_buf();

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::GatewayFailed {
                gateway: String::new(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            gateways: config.gateways.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
            temp_dir,
            _temp_dir_guard: temp_dir_guard,
        })
    }

    /// Fetch a legacy (single-file) video, trying each gateway in order.
    ///
    /// The last gateway gets `max_retries` extra attempts with exponential
    /// backoff. Returns `AllGatewaysExhausted` only after every gateway has
    /// been tried at least once.
    pub async fn fetch(
        &self,
        content_id: &str,
        author: &str,
        permlink: &str,
    ) -> Result<MediaFile, FetchError> {
        let dest = self.temp_dir.join(media_file_name(author, permlink, content_id, "mp4"));
        self.fetch_to(content_id, dest, false).await
    }

    /// Fetch an HLS (embed) video.
    ///
    /// The content id addresses a directory whose `manifest.m3u8` names the
    /// media segments; segments are downloaded in manifest order and
    /// concatenated into one transport-stream file. Gateway order and
    /// last-gateway retries work exactly as for [`fetch`](Self::fetch).
    pub async fn fetch_hls(
        &self,
        content_id: &str,
        author: &str,
        permlink: &str,
    ) -> Result<MediaFile, FetchError> {
        let dest = self.temp_dir.join(media_file_name(author, permlink, content_id, "ts"));
        self.fetch_to(content_id, dest, true).await
    }

    /// Directory downloaded media is staged in
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    async fn fetch_to(
        &self,
        content_id: &str,
        dest: PathBuf,
        hls: bool,
    ) -> Result<MediaFile, FetchError> {
        let gateway_count = self.gateways.len();

        for (position, gateway) in self.gateways.iter().enumerate() {
            let is_last = position + 1 == gateway_count;
            let attempts = if is_last { 1 + self.max_retries as u64 } else { 1 };

            for attempt in 0..attempts {
                if attempt > 0 {
                    let delay = self.backoff_base_ms * (1u64 << (attempt - 1));
                    debug!("Backing off {}ms before retrying {}", delay, gateway);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }

                let result = if hls {
                    self.download_hls_from(gateway, content_id, &dest).await
                } else {
                    self.download_from(gateway, content_id, &dest).await
                };

                match result {
                    Ok(size_bytes) => {
                        info!(
                            "Fetched {} ({} bytes) from {}",
                            content_id, size_bytes, gateway
                        );
                        return Ok(MediaFile { path: dest, size_bytes });
                    }
                    Err(e) => {
                        warn!("Gateway attempt failed: {}", e);
                    }
                }
            }
        }

        Err(FetchError::AllGatewaysExhausted {
            content_id: content_id.to_string(),
            attempted: gateway_count,
        })
    }

    /// One download attempt against one gateway, streaming to `dest`.
    async fn download_from(
        &self,
        gateway: &str,
        content_id: &str,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let url = format!("{}/{}", gateway.trim_end_matches('/'), content_id);
        debug!("Downloading {}", url);

        let result = tokio::time::timeout(self.timeout, async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: e.to_string(),
                })?;

            let response = response.error_for_status().map_err(|e| FetchError::GatewayFailed {
                gateway: gateway.to_string(),
                message: e.to_string(),
            })?;

            let mut file = File::create(dest).await?;
            let mut stream = response.bytes_stream();
            let mut size_bytes: u64 = 0;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: e.to_string(),
                })?;
                size_bytes += chunk.len() as u64;
                file.write_all(&chunk).await?;
            }

            file.flush().await?;
            Ok::<u64, FetchError>(size_bytes)
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => {
                // Partial file from a timed-out attempt must not survive
                let _ = std::fs::remove_file(dest);
                Err(FetchError::GatewayTimeout {
                    gateway: gateway.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }

    /// One HLS download attempt against one gateway: fetch the manifest,
    /// then stream every listed segment into `dest` in manifest order.
    async fn download_hls_from(
        &self,
        gateway: &str,
        content_id: &str,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let base = format!("{}/{}", gateway.trim_end_matches('/'), content_id);
        let manifest_url = format!("{}/manifest.m3u8", base);
        debug!("Downloading HLS manifest {}", manifest_url);

        let result = tokio::time::timeout(self.timeout, async {
            let manifest = self
                .client
                .get(&manifest_url)
                .send()
                .await
                .map_err(|e| FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: e.to_string(),
                })?
                .error_for_status()
                .map_err(|e| FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: e.to_string(),
                })?
                .text()
                .await
                .map_err(|e| FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: e.to_string(),
                })?;

            let segments = parse_manifest_segments(&manifest);
            if segments.is_empty() {
                return Err(FetchError::GatewayFailed {
                    gateway: gateway.to_string(),
                    message: format!("Manifest {} lists no media segments", manifest_url),
                });
            }
            debug!("Manifest lists {} segments", segments.len());

            let mut file = File::create(dest).await?;
            let mut size_bytes: u64 = 0;

            for segment in segments {
                let url = format!("{}/{}", base, segment);
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| FetchError::GatewayFailed {
                        gateway: gateway.to_string(),
                        message: e.to_string(),
                    })?
                    .error_for_status()
                    .map_err(|e| FetchError::GatewayFailed {
                        gateway: gateway.to_string(),
                        message: e.to_string(),
                    })?;

                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| FetchError::GatewayFailed {
                        gateway: gateway.to_string(),
                        message: e.to_string(),
                    })?;
                    size_bytes += chunk.len() as u64;
                    file.write_all(&chunk).await?;
                }
            }

            file.flush().await?;
            Ok::<u64, FetchError>(size_bytes)
        })
        .await;

        match result {
            Ok(Ok(size_bytes)) => Ok(size_bytes),
            Ok(Err(e)) => {
                // A partially concatenated file must not survive the attempt
                let _ = std::fs::remove_file(dest);
                Err(e)
            }
            Err(_) => {
                let _ = std::fs::remove_file(dest);
                Err(FetchError::GatewayTimeout {
                    gateway: gateway.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

/// Media segment entries of an m3u8 manifest, in listed order
fn parse_manifest_segments(manifest: &str) -> Vec<&str> {
    manifest
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Temp file name convention: `{author}_{permlink}_{cid8}.{ext}`
fn media_file_name(author: &str, permlink: &str, content_id: &str, extension: &str) -> String {
    let cid8: String = content_id.chars().take(8).collect();
    format!("{}_{}_{}.{}", author, permlink, cid8, extension)
}
