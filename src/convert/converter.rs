//! Batched archive to columnar conversion
//!
//! Output is staged in a scratch directory next to the destination and only
//! renamed into place once every batch has been written.

use super::types::{ConvertOptions, ConvertReport};
use crate::archive::{ArchiveReader, Batch, BatchPlan};
use crate::error::{Error, Result};
use crate::output::{BatchSink, ParquetSink};
use crate::progress::{NoProgress, ProgressSink};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const SCRATCH_PREFIX: &str = ".tmp-";
const MEMBERS_DIR: &str = "members";
const STAGED_DIR: &str = "output.d";

/// Converts matching archive members into one output file per batch
#[derive(Debug, Clone)]
pub struct Converter<S = ParquetSink> {
    sink: S,
    options: ConvertOptions,
}

impl Converter<ParquetSink> {
    /// Converter writing Parquet with default writer settings
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_sink(ParquetSink::new(), options)
    }
}

impl<S: BatchSink> Converter<S> {
    /// Converter writing through a custom sink
    pub fn with_sink(sink: S, options: ConvertOptions) -> Self {
        Self { sink, options }
    }

    /// Selection and batching options
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// The output sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Convert `archive` into `output_dir`
    ///
    /// On failure `output_dir` is left as it was. On success it holds exactly
    /// one file per batch and nothing else.
    pub fn convert(
        &self,
        archive: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        progress: &dyn ProgressSink,
    ) -> Result<ConvertReport> {
        let archive = archive.as_ref();
        let output_dir = output_dir.as_ref();
        let pattern = self.options.validate()?;

        let mut reader = ArchiveReader::open(archive)?;
        let members = reader.matching_members(&pattern)?;
        if members.is_empty() {
            return Err(Error::NoMatchingMembers {
                archive: archive.to_path_buf(),
                pattern: pattern.as_str().to_string(),
            });
        }

        let member_count = members.len();
        let plan = BatchPlan::new(members, self.options.batch_size)?;
        info!(
            "Converting {} member(s) of {} into {} batch(es)",
            member_count,
            archive.display(),
            plan.len()
        );

        let scratch = create_scratch(output_dir)?;
        debug!("Scratch area: {}", scratch.path().display());

        progress.start(
            &format!("Converting {}", archive.display()),
            Some(plan.len() as u64),
            0,
        );
        let result = self.run(&mut reader, plan, scratch.path(), output_dir, progress);
        progress.finish();

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove scratch area {}: {}",
                scratch_path.display(),
                e
            );
        }

        let (files, rows) = result?;
        info!(
            "Wrote {} file(s) with {} row(s) to {}",
            files.len(),
            rows.iter().sum::<u64>(),
            output_dir.display()
        );

        Ok(ConvertReport {
            output_dir: output_dir.to_path_buf(),
            members: member_count,
            files,
            rows,
        })
    }

    fn run(
        &self,
        reader: &mut ArchiveReader,
        plan: BatchPlan,
        scratch: &Path,
        output_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<(Vec<PathBuf>, Vec<u64>)> {
        let members_dir = scratch.join(MEMBERS_DIR);
        let staged_dir = scratch.join(STAGED_DIR);
        create_dir(&members_dir)?;
        create_dir(&staged_dir)?;

        let file_names: Vec<String> = plan
            .batches()
            .iter()
            .map(|batch| {
                plan.file_name(batch.index, &self.options.file_prefix, self.sink.extension())
            })
            .collect();

        let mut rows = Vec::with_capacity(plan.len());
        for (batch, file_name) in plan.into_iter().zip(&file_names) {
            let index = batch.index;
            let written = self
                .write_batch(reader, &batch, &members_dir, &staged_dir.join(file_name))
                .map_err(|e| Error::conversion(index, e))?;
            debug!("Batch {} -> {} ({} rows)", index, file_name, written);
            rows.push(written);
            progress.advance(1);
        }

        commit(&staged_dir, output_dir)?;

        let files = file_names
            .iter()
            .map(|name| output_dir.join(name))
            .collect();
        Ok((files, rows))
    }

    fn write_batch(
        &self,
        reader: &mut ArchiveReader,
        batch: &Batch,
        members_dir: &Path,
        destination: &Path,
    ) -> Result<u64> {
        let extracted = reader.extract_members(&batch.members, members_dir)?;
        let rows = self.sink.write_batch(&extracted, destination)?;

        fs::remove_dir_all(members_dir).map_err(|e| {
            Error::filesystem(members_dir, format!("Failed to clear extracted members: {e}"))
        })?;
        create_dir(members_dir)?;

        Ok(rows)
    }
}

/// Convert with the default Parquet sink and no progress reporting
pub fn convert_archive(
    archive: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    member_glob: &str,
    batch_size: usize,
) -> Result<PathBuf> {
    let options = ConvertOptions::new(member_glob).with_batch_size(batch_size);
    let report = Converter::new(options).convert(archive, output_dir, &NoProgress)?;
    Ok(report.output_dir)
}

/// Create the scratch directory beside `output_dir`, creating its parent first
fn create_scratch(output_dir: &Path) -> Result<TempDir> {
    let parent = match output_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| Error::filesystem(parent, format!("Failed to create directory: {e}")))?;

    tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| Error::filesystem(parent, format!("Failed to create scratch area: {e}")))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)
        .map_err(|e| Error::filesystem(path, format!("Failed to create directory: {e}")))
}

/// Replace `output_dir` with the staged directory
fn commit(staged: &Path, output_dir: &Path) -> Result<()> {
    match fs::remove_dir_all(output_dir) {
        Ok(()) => info!("Replaced previous output at {}", output_dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::filesystem(
                output_dir,
                format!("Failed to remove previous output: {e}"),
            ))
        }
    }

    fs::rename(staged, output_dir).map_err(|e| {
        Error::filesystem(output_dir, format!("Failed to move output into place: {e}"))
    })
}
