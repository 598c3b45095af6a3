//! Convert module
//!
//! Turns a zip archive of gzipped JSON members into a directory of columnar
//! files, one per fixed-size batch of members.
//!
//! # Overview
//!
//! - `Converter` - extract, convert and commit batch by batch
//! - `ConvertOptions` - member selection, batch size and file naming
//! - `convert_archive` - one-call conversion with the Parquet sink

mod converter;
mod types;

pub use converter::{convert_archive, Converter};
pub use types::{
    ConvertOptions, ConvertReport, DEFAULT_BATCH_SIZE, DEFAULT_FILE_PREFIX, DEFAULT_MEMBER_GLOB,
};
