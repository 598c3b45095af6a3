//! Columnar sinks
//!
//! A sink turns one batch of extracted member files into exactly one output
//! file. The converter treats it as opaque.

use super::schema::{json_to_arrow, SchemaInference};
use super::writer::{ParquetWriter, ParquetWriterConfig};
use crate::decode::GzipJsonReader;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Converts a batch of input files into one output file
pub trait BatchSink {
    /// Extension of produced files, without the dot
    fn extension(&self) -> &str;

    /// Write every record of `inputs` to `destination`, returning the row count
    fn write_batch(&self, inputs: &[PathBuf], destination: &Path) -> Result<u64>;
}

/// Writes gzipped JSON inputs as one Parquet file
///
/// Inputs are read twice: once to infer the schema, once to write rows in
/// row-group sized chunks.
#[derive(Debug, Clone, Default)]
pub struct ParquetSink {
    config: ParquetWriterConfig,
}

impl ParquetSink {
    /// Create a sink with default writer settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with custom writer settings
    pub fn with_config(config: ParquetWriterConfig) -> Self {
        Self { config }
    }

    /// Writer settings
    pub fn config(&self) -> &ParquetWriterConfig {
        &self.config
    }
}

impl BatchSink for ParquetSink {
    fn extension(&self) -> &str {
        "parquet"
    }

    fn write_batch(&self, inputs: &[PathBuf], destination: &Path) -> Result<u64> {
        let mut inference = SchemaInference::new();
        for path in inputs {
            for record in GzipJsonReader::open(path)? {
                inference.observe(&record?);
            }
        }

        if inference.records_seen() == 0 {
            return Err(Error::output(format!(
                "No records found in {} input file(s)",
                inputs.len()
            )));
        }

        let schema = inference.finish();
        if schema.fields().is_empty() {
            return Err(Error::output("Records have no fields"));
        }
        debug!(
            "Inferred {} column(s) for {}",
            schema.fields().len(),
            destination.display()
        );

        let chunk_size = self.config.row_group_size();
        let mut writer = ParquetWriter::new(destination, &schema, &self.config)?;
        let mut chunk: Vec<Value> = Vec::with_capacity(chunk_size);

        for path in inputs {
            for record in GzipJsonReader::open(path)? {
                chunk.push(record?);
                if chunk.len() >= chunk_size {
                    writer.write(&json_to_arrow(&chunk, Some(&schema))?)?;
                    chunk.clear();
                }
            }
        }
        if !chunk.is_empty() {
            writer.write(&json_to_arrow(&chunk, Some(&schema))?)?;
        }

        let rows = writer.close()?;
        Ok(rows as u64)
    }
}
