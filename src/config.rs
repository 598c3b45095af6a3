//! Pipeline configuration
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file
//! at all) gives a working configuration.

use crate::archive::MemberPattern;
use crate::bulk::DEFAULT_ARCHIVE_GLOB;
use crate::convert::{
    ConvertOptions, DEFAULT_BATCH_SIZE, DEFAULT_FILE_PREFIX, DEFAULT_MEMBER_GLOB,
};
use crate::download::DownloaderConfig;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::output::{ParquetCompression, ParquetWriterConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding downloaded archives and converted output
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Downloader settings
    #[serde(default)]
    pub download: DownloadSettings,

    /// Conversion settings
    #[serde(default)]
    pub convert: ConvertSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http: HttpSettings::default(),
            download: DownloadSettings::default(),
            convert: ConvertSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl PipelineConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.write_buffer_size == 0 {
            return Err(Error::invalid_value(
                "download.write_buffer_size",
                "must be greater than zero",
            ));
        }
        if self.convert.batch_size == 0 {
            return Err(Error::invalid_value(
                "convert.batch_size",
                "must be greater than zero",
            ));
        }
        if self.convert.rows_per_group == 0 {
            return Err(Error::invalid_value(
                "convert.rows_per_group",
                "must be greater than zero",
            ));
        }
        if self.convert.output_name.is_empty() {
            return Err(Error::invalid_value(
                "convert.output_name",
                "cannot be empty",
            ));
        }

        for (field, glob) in [
            ("convert.member_glob", &self.convert.member_glob),
            ("convert.archive_glob", &self.convert.archive_glob),
        ] {
            if glob.is_empty() {
                return Err(Error::invalid_value(field, "cannot be empty"));
            }
            MemberPattern::new(glob.as_str())
                .map_err(|e| Error::invalid_value(field, e.to_string()))?;
        }

        Ok(())
    }

    /// Where `convert-latest` writes its output
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join(&self.convert.output_name)
    }

    /// HTTP client settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.http.request_timeout_secs),
            default_headers: self.http.headers.clone(),
            ..HttpClientConfig::default()
        };
        if let Some(agent) = &self.http.user_agent {
            config.user_agent.clone_from(agent);
        }
        config
    }

    /// Downloader settings
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            write_buffer_size: self.download.write_buffer_size,
        }
    }

    /// Member selection and batching
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions::new(self.convert.member_glob.as_str())
            .with_batch_size(self.convert.batch_size)
            .with_file_prefix(self.convert.file_prefix.as_str())
    }

    /// Parquet writer settings
    pub fn writer_config(&self) -> ParquetWriterConfig {
        ParquetWriterConfig::new()
            .with_compression(self.convert.compression)
            .with_row_group_size(self.convert.rows_per_group)
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Total timeout for JSON requests in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            headers: HashMap::new(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

// ============================================================================
// Download
// ============================================================================

/// Downloader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Write buffer capacity in bytes
    #[serde(default = "default_write_buffer_size")]
    pub write_buffer_size: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            write_buffer_size: default_write_buffer_size(),
        }
    }
}

fn default_write_buffer_size() -> usize {
    8192
}

// ============================================================================
// Convert
// ============================================================================

/// Conversion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSettings {
    /// Archive members to convert
    #[serde(default = "default_member_glob")]
    pub member_glob: String,

    /// Archives considered by `convert-latest`
    #[serde(default = "default_archive_glob")]
    pub archive_glob: String,

    /// Members per output file
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Output directory name under the data directory
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Output file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Rows per Parquet row group
    #[serde(default = "default_rows_per_group")]
    pub rows_per_group: usize,

    /// Parquet compression codec
    #[serde(default)]
    pub compression: ParquetCompression,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            member_glob: default_member_glob(),
            archive_glob: default_archive_glob(),
            batch_size: default_batch_size(),
            output_name: default_output_name(),
            file_prefix: default_file_prefix(),
            rows_per_group: default_rows_per_group(),
            compression: ParquetCompression::default(),
        }
    }
}

fn default_member_glob() -> String {
    DEFAULT_MEMBER_GLOB.to_string()
}

fn default_archive_glob() -> String {
    DEFAULT_ARCHIVE_GLOB.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_output_name() -> String {
    "bulk.parquet.d".to_string()
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

fn default_rows_per_group() -> usize {
    65_536
}
