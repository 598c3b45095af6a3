// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # bulk-pipeline
//!
//! Resumable acquisition and batched conversion of large bulk data dumps.
//!
//! ## Features
//!
//! - **Resumable Downloads**: Skip complete files, resume partial ones with HTTP range requests
//! - **Batched Conversion**: Zip archives of gzipped JSON to one Parquet file per batch
//! - **Atomic Output**: Results are staged in a scratch area and renamed into place
//! - **Bulk Listings**: Download every file of a bulk-download listing in one call
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulk_pipeline::{convert_archive, Downloader, HttpClient, NoProgress, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let downloader = Downloader::new(HttpClient::new()?);
//!     let archive = downloader
//!         .fetch(
//!             "https://example.com/bulk-light-vehicle_20240101.zip",
//!             "data/bulk-light-vehicle_20240101.zip",
//!             Some(1_234_567),
//!             &NoProgress,
//!         )
//!         .await?;
//!
//!     convert_archive(&archive, "data/bulk.parquet.d", "bulk-light-vehicle_*_*.json.gz", 10)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   ┌──────────────────────────────────────┐
//! │      Resumable Downloader    │   │        Batch Archive Converter       │
//! │  plan_fetch → Skip / Resume  │   │  list → filter → batch → extract     │
//! │  / Fresh → stream to file    │   │  → sink → clean → commit (rename)    │
//! └──────────────┬───────────────┘   └───────────────┬──────────────────────┘
//!                │                                   │
//! ┌──────────────┴──────┬────────────┬───────────────┴───┬─────────────────┐
//! │        HTTP         │  Progress  │      Archive      │  Decode/Output  │
//! ├─────────────────────┼────────────┼───────────────────┼─────────────────┤
//! │ reqwest, Range      │ Log / None │ zip, wildcards    │ gzip JSON       │
//! │ status → errors     │            │ batch plan        │ Arrow, Parquet  │
//! └─────────────────────┴────────────┴───────────────────┴─────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Document error variant fields before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Progress reporting side channel
pub mod progress;

/// HTTP client
pub mod http;

/// Resumable downloads
pub mod download;

/// Zip listing, member selection and batching
pub mod archive;

/// Gzipped JSON record decoding
pub mod decode;

/// Arrow/Parquet output
pub mod output;

/// Batched archive conversion
pub mod convert;

/// Bulk-download listings
pub mod bulk;

/// Pipeline configuration
pub mod config;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};

// Re-export commonly used types
pub use bulk::{download_bulk_data, latest_archive, BulkFile, BulkManifest};
pub use config::PipelineConfig;
pub use convert::{convert_archive, ConvertOptions, ConvertReport, Converter};
pub use download::{plan_fetch, DownloadTask, Downloader, FetchPlan};
pub use http::HttpClient;
pub use output::{BatchSink, ParquetSink};
pub use progress::{BarProgress, NoProgress, ProgressSink, ProgressUnit};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
