//! HTTP client module
//!
//! Thin reqwest wrapper used for bulk downloads and manifest lookups.
//!
//! # Features
//!
//! - **Range requests**: `RequestConfig::range_from` for resumable transfers
//! - **Status classification**: non-2xx responses become `Error::HttpStatus`
//! - **Timeouts**: connect timeout everywhere, total timeout for JSON only

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};

#[cfg(test)]
mod tests;
