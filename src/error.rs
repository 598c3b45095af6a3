//! Error types for bulk-pipeline
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for bulk-pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Network Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Download of {path} ended at {actual} bytes, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Archive Errors
    // ============================================================================
    #[error("No members of {archive} match pattern '{pattern}'")]
    NoMatchingMembers { archive: PathBuf, pattern: String },

    #[error("Invalid archive {archive}: {message}")]
    InvalidArchive { archive: PathBuf, message: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ============================================================================
    // Conversion Errors
    // ============================================================================
    #[error("Batch {batch} failed: {source}")]
    Conversion {
        batch: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Filesystem Errors
    // ============================================================================
    #[error("Filesystem error at {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure, non-success status or truncated transfer
    Network,
    /// The archive has no usable members
    InvalidArchiveContent,
    /// Extracting, decoding or writing a batch failed
    Conversion,
    /// Directories could not be created, removed or renamed
    Filesystem,
    /// Bad configuration
    Config,
    /// Anything else
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error for a file
    pub fn decode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a filesystem error for a path
    pub fn filesystem(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an invalid archive error
    pub fn invalid_archive(archive: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidArchive {
            archive: archive.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while processing a batch
    pub fn conversion(batch: usize, source: Error) -> Self {
        Self::Conversion {
            batch,
            source: Box::new(source),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::SizeMismatch { .. }
            | Error::InvalidUrl(_) => ErrorKind::Network,
            Error::NoMatchingMembers { .. } | Error::InvalidArchive { .. } => {
                ErrorKind::InvalidArchiveContent
            }
            Error::Conversion { .. }
            | Error::Decode { .. }
            | Error::Arrow(_)
            | Error::Parquet(_)
            | Error::Output { .. }
            | Error::Zip(_) => ErrorKind::Conversion,
            Error::Filesystem { .. } | Error::Io(_) => ErrorKind::Filesystem,
            Error::Config { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_) => ErrorKind::Config,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if a caller-level retry is likely to help
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::SizeMismatch { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for bulk-pipeline
pub type Result<T> = std::result::Result<T, Error>;
