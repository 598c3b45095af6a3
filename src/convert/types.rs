//! Converter options and results

use crate::archive::MemberPattern;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Member pattern of the per-vehicle bulk files
pub const DEFAULT_MEMBER_GLOB: &str = "bulk-light-vehicle_*_*.json.gz";

/// Members per output file
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Output file name prefix
pub const DEFAULT_FILE_PREFIX: &str = "bulk";

/// What to select from an archive and how to group it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// `fnmatch`-style wildcard for member names
    pub member_glob: String,
    /// Maximum members per output file
    pub batch_size: usize,
    /// Output files are named `{file_prefix}_{index}.{ext}`
    pub file_prefix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            member_glob: DEFAULT_MEMBER_GLOB.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl ConvertOptions {
    /// Options selecting `member_glob` with default batching
    pub fn new(member_glob: impl Into<String>) -> Self {
        Self {
            member_glob: member_glob.into(),
            ..Self::default()
        }
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the output file prefix
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Check the options and compile the member pattern
    pub fn validate(&self) -> Result<MemberPattern> {
        if self.batch_size == 0 {
            return Err(Error::invalid_value(
                "batch_size",
                "must be greater than zero",
            ));
        }
        if self.file_prefix.is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(Error::invalid_value(
                "file_prefix",
                format!("'{}' is not a plain file name prefix", self.file_prefix),
            ));
        }
        MemberPattern::new(self.member_glob.as_str())
    }
}

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    /// The committed output directory
    pub output_dir: PathBuf,
    /// Members that matched the pattern
    pub members: usize,
    /// Output files in batch order
    pub files: Vec<PathBuf>,
    /// Rows written per batch
    pub rows: Vec<u64>,
}

impl ConvertReport {
    /// Number of batches written
    pub fn batches(&self) -> usize {
        self.files.len()
    }

    /// Rows written across all batches
    pub fn total_rows(&self) -> u64 {
        self.rows.iter().sum()
    }
}
