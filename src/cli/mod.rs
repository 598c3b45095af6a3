//! CLI module
//!
//! Command-line interface for the download and conversion pipeline.
//!
//! # Commands
//!
//! - `fetch` - Download one file with resume
//! - `bulk-urls` - Show the bulk-download listing
//! - `download-bulk` - Download every file of a listing
//! - `convert` - Convert an archive to Parquet
//! - `convert-latest` - Convert the newest archive in the data directory

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
