//! Download types
//!
//! Task description and the skip/resume/fresh decision.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One remote file to fetch to one local path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Source URL
    pub url: String,
    /// Local destination path
    pub destination: PathBuf,
    /// Expected total size in bytes, when known from external metadata
    #[serde(default)]
    pub expected_size: Option<u64>,
}

impl DownloadTask {
    /// Create a task with unknown size
    pub fn new(url: impl Into<String>, destination: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            destination: destination.as_ref().to_path_buf(),
            expected_size: None,
        }
    }

    /// Set the expected size
    #[must_use]
    pub fn with_expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    /// Display label used for progress and logs
    pub fn label(&self) -> String {
        self.destination.file_name().map_or_else(
            || self.destination.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

/// What to do for a download given what is already on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// The destination is already complete
    Skip,
    /// Request bytes from this offset and append
    ResumeFrom(u64),
    /// Request the whole file and write it from scratch
    FreshFetch,
}

/// Decide how to fetch a file
///
/// `local_len` is the size of the existing regular file at the destination,
/// or `None` if there is none.
///
/// - An existing file is complete when no size is expected or its length
///   matches the expected size.
/// - A shorter, non-empty file is a valid prefix and is resumed.
/// - A missing, empty or oversized file is fetched fresh.
pub fn plan_fetch(local_len: Option<u64>, expected_size: Option<u64>) -> FetchPlan {
    match (local_len, expected_size) {
        (Some(_), None) => FetchPlan::Skip,
        (Some(len), Some(expected)) if len == expected => FetchPlan::Skip,
        (Some(len), Some(expected)) if len > 0 && len < expected => FetchPlan::ResumeFrom(len),
        _ => FetchPlan::FreshFetch,
    }
}

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Destination path
    pub path: PathBuf,
    /// The plan that was carried out
    pub plan: FetchPlan,
    /// Bytes received over the network in this call
    pub bytes_transferred: u64,
}
