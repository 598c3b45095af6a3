//! Decode module
//!
//! Streams JSON records out of gzipped member files.

mod gzip_json;

pub use gzip_json::{read_records, GzipJsonReader, JsonLayout};
