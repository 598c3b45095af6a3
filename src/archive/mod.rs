//! Archive module
//!
//! Zip member listing, wildcard selection and batch partitioning.
//!
//! # Overview
//!
//! - `ArchiveReader` - list and extract zip members
//! - `MemberPattern` - `fnmatch`-style wildcard selection
//! - `BatchPlan` - ordered, fixed-size batches with padded output names

mod batch;
mod pattern;
mod reader;

pub use batch::{index_width, Batch, BatchPlan};
pub use pattern::MemberPattern;
pub use reader::ArchiveReader;

#[cfg(test)]
mod tests;
