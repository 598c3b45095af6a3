//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Download and convert bulk vehicle history data
#[derive(Parser, Debug)]
#[command(name = "bulk-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configured one)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one file, resuming a partial copy if present
    Fetch {
        /// Remote URL
        url: String,

        /// Local destination path
        dest: PathBuf,

        /// Expected size in bytes
        #[arg(long)]
        expected_size: Option<u64>,
    },

    /// Show the bulk-download listing
    BulkUrls {
        /// Listing location (local JSON file or URL)
        #[arg(short, long)]
        manifest: String,
    },

    /// Download every bulk and delta file of a listing
    DownloadBulk {
        /// Listing location (local JSON file or URL)
        #[arg(short, long)]
        manifest: String,

        /// Destination directory (defaults to the data directory)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Convert a zip archive of gzipped JSON files to Parquet
    Convert {
        /// Zip archive
        archive: PathBuf,

        /// Output directory (replaced on success)
        output: PathBuf,

        /// Member name pattern
        #[arg(short, long)]
        pattern: Option<String>,

        /// Members per output file
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Convert the most recent bulk archive in the data directory
    ConvertLatest,
}
