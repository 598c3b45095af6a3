//! Partitioning of member names into fixed-size batches

use crate::error::{Error, Result};

/// One group of member names, processed as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of the batch
    pub index: usize,
    /// Member names in archive order
    pub members: Vec<String>,
}

/// Ordered batches plus the padding width for their output names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    batches: Vec<Batch>,
    width: usize,
}

impl BatchPlan {
    /// Split `names` into batches of at most `batch_size`, preserving order
    pub fn new(names: Vec<String>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_value(
                "batch_size",
                "must be greater than zero",
            ));
        }

        let batches: Vec<Batch> = names
            .chunks(batch_size)
            .enumerate()
            .map(|(index, chunk)| Batch {
                index,
                members: chunk.to_vec(),
            })
            .collect();
        let width = index_width(batches.len());

        Ok(Self { batches, width })
    }

    /// Number of batches
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Whether there are no batches
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Zero-padding width for batch indices
    pub fn width(&self) -> usize {
        self.width
    }

    /// Batches in order
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Output file name for a batch, e.g. `bulk_07.parquet`
    pub fn file_name(&self, index: usize, prefix: &str, extension: &str) -> String {
        format!("{prefix}_{index:0width$}.{extension}", width = self.width)
    }
}

impl IntoIterator for BatchPlan {
    type Item = Batch;
    type IntoIter = std::vec::IntoIter<Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}

/// Decimal digits in the batch count
pub fn index_width(batch_count: usize) -> usize {
    batch_count.to_string().len()
}
