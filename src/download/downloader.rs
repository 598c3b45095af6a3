//! Resumable downloader
//!
//! Streams one remote file into one local path, skipping files that are
//! already complete and resuming partial ones with a range request.

use super::types::{plan_fetch, DownloadOutcome, DownloadTask, FetchPlan};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::progress::ProgressSink;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the downloader
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Capacity of the write buffer between the network and the file
    pub write_buffer_size: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: 8192,
        }
    }
}

/// Downloader for large remote files
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    config: DownloaderConfig,
}

impl Downloader {
    /// Create a downloader with default settings
    pub fn new(client: HttpClient) -> Self {
        Self::with_config(client, DownloaderConfig::default())
    }

    /// Create a downloader with custom settings
    pub fn with_config(client: HttpClient, config: DownloaderConfig) -> Self {
        Self { client, config }
    }

    /// Fetch `url` to `destination` and return the destination path
    pub async fn fetch(
        &self,
        url: &str,
        destination: impl AsRef<Path>,
        expected_size: Option<u64>,
        progress: &dyn ProgressSink,
    ) -> Result<PathBuf> {
        let mut task = DownloadTask::new(url, destination);
        task.expected_size = expected_size;
        let outcome = self.fetch_task(&task, progress).await?;
        Ok(outcome.path)
    }

    /// Carry out a download task
    pub async fn fetch_task(
        &self,
        task: &DownloadTask,
        progress: &dyn ProgressSink,
    ) -> Result<DownloadOutcome> {
        let destination = task.destination.as_path();
        let local_len = local_file_len(destination).await?;
        let plan = plan_fetch(local_len, task.expected_size);

        if plan == FetchPlan::Skip {
            info!(
                "File {} already exists. Skipping download.",
                destination.display()
            );
            return Ok(DownloadOutcome {
                path: destination.to_path_buf(),
                plan,
                bytes_transferred: 0,
            });
        }

        let url = Url::parse(&task.url)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::filesystem(parent, format!("Failed to create directory: {e}"))
            })?;
        }

        let request = match plan {
            FetchPlan::ResumeFrom(offset) => {
                info!(
                    "Resuming {} from byte {offset}",
                    destination.display()
                );
                RequestConfig::new().range_from(offset)
            }
            _ => RequestConfig::new(),
        };

        let mut response = self.client.get_with_config(url.as_str(), request).await?;

        let (file, initial) = match plan {
            FetchPlan::ResumeFrom(offset) if response.status() == StatusCode::PARTIAL_CONTENT => {
                match content_range_start(&response) {
                    Some(start) if start == offset => (open_for_append(destination).await?, offset),
                    Some(0) => {
                        warn!(
                            "Partial response for {} starts at byte 0, rewriting from zero",
                            task.url
                        );
                        (open_truncated(destination).await?, 0)
                    }
                    start => {
                        warn!(
                            "Partial response for {} starts at {start:?}, expected byte {offset}; refetching in full",
                            task.url
                        );
                        response = self
                            .client
                            .get_with_config(url.as_str(), RequestConfig::new())
                            .await?;
                        (open_truncated(destination).await?, 0)
                    }
                }
            }
            FetchPlan::ResumeFrom(_) => {
                warn!(
                    "Server ignored range request for {} ({}), restarting from zero",
                    task.url,
                    response.status().as_u16()
                );
                (open_truncated(destination).await?, 0)
            }
            _ => (open_truncated(destination).await?, 0),
        };

        let total = task
            .expected_size
            .or_else(|| response.content_length().map(|len| len + initial));

        progress.start(&format!("Downloading {}", task.label()), total, initial);
        let streamed = self.stream_body(response, file, progress).await;
        progress.finish();
        let bytes_transferred = streamed?;

        if let Some(expected) = task.expected_size {
            let actual = tokio::fs::metadata(destination).await?.len();
            if actual != expected {
                return Err(Error::SizeMismatch {
                    path: destination.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }

        debug!(
            "Downloaded {} bytes into {}",
            bytes_transferred,
            destination.display()
        );

        Ok(DownloadOutcome {
            path: destination.to_path_buf(),
            plan,
            bytes_transferred,
        })
    }

    /// Copy the response body into the file chunk by chunk
    ///
    /// Whatever was received is flushed even when the stream breaks, so the
    /// partial file stays resumable.
    async fn stream_body(
        &self,
        mut response: Response,
        file: File,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let mut writer = BufWriter::with_capacity(self.config.write_buffer_size, file);
        let mut written = 0u64;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    let _ = writer.flush().await;
                    return Err(Error::Http(e));
                }
            };
            if chunk.is_empty() {
                continue;
            }

            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
            progress.advance(chunk.len() as u64);
        }

        writer.flush().await?;
        Ok(written)
    }
}

/// First byte position of a `Content-Range: bytes START-END/TOTAL` header
fn content_range_start(response: &Response) -> Option<u64> {
    let value = response.headers().get(CONTENT_RANGE)?.to_str().ok()?;
    parse_content_range_start(value)
}

pub(crate) fn parse_content_range_start(value: &str) -> Option<u64> {
    let (unit, range) = value.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (start, _) = range.trim().split_once('-')?;
    start.parse().ok()
}

/// Size of the regular file at `path`, `None` if nothing is there
async fn local_file_len(path: &Path) -> Result<Option<u64>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Err(Error::filesystem(
            path,
            "Destination exists but is not a regular file",
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::filesystem(path, format!("Failed to stat: {e}"))),
    }
}

async fn open_for_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| Error::filesystem(path, format!("Failed to open for append: {e}")))
}

async fn open_truncated(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| Error::filesystem(path, format!("Failed to create file: {e}")))
}
