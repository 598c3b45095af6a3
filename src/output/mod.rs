//! Output module
//!
//! Handles Arrow RecordBatch creation and Parquet file writing.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Inferring Arrow schemas from JSON records, incrementally
//! - Converting JSON to Arrow RecordBatches and back
//! - Writing Parquet files
//! - The `BatchSink` seam used by the archive converter

mod schema;
mod sink;
mod writer;

pub use schema::{arrow_to_json, infer_schema, json_to_arrow, merge_schemas, SchemaInference};
pub use sink::{BatchSink, ParquetSink};
pub use writer::{
    write_batch_to_parquet, ParquetCompression, ParquetWriter, ParquetWriterConfig,
};
