//! Download module
//!
//! Resumable, idempotent fetching of large remote files.
//!
//! # Overview
//!
//! - `plan_fetch` - pure decision between skip, resume and fresh fetch
//! - `Downloader` - carries out the plan over HTTP
//! - `DownloadTask` - what to fetch and where

mod downloader;
mod types;

pub use downloader::{Downloader, DownloaderConfig};
pub use types::{plan_fetch, DownloadOutcome, DownloadTask, FetchPlan};
