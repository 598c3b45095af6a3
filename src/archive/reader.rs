//! Read-only access to zip archives
//!
//! Lists members in archive order and extracts selected members by name.

use super::pattern::MemberPattern;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// An opened zip archive
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ArchiveReader {
    /// Open an archive read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| Error::filesystem(&path, format!("Failed to open archive: {e}")))?;
        let archive = ZipArchive::new(file)
            .map_err(|e| Error::invalid_archive(&path, format!("Failed to read zip: {e}")))?;

        Ok(Self { path, archive })
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries, directories included
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether the archive has no entries
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// File member names in archive order
    pub fn member_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index_raw(index)?;
            if entry.is_dir() {
                continue;
            }
            names.push(entry.name().to_string());
        }
        Ok(names)
    }

    /// File member names matching `pattern`, in archive order
    pub fn matching_members(&mut self, pattern: &MemberPattern) -> Result<Vec<String>> {
        let names = self.member_names()?;
        Ok(pattern.filter(&names))
    }

    /// Extract the named members under `dest`, returning the written paths
    ///
    /// Member paths are kept relative to `dest`. Names that would escape it
    /// are rejected.
    pub fn extract_members(&mut self, names: &[String], dest: &Path) -> Result<Vec<PathBuf>> {
        let mut extracted = Vec::with_capacity(names.len());

        for name in names {
            let mut entry = self.archive.by_name(name)?;
            let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
                Error::invalid_archive(&self.path, format!("Unsafe member path: {name}"))
            })?;
            let out_path = dest.join(relative);

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::filesystem(parent, format!("Failed to create directory: {e}"))
                })?;
            }

            let mut out = File::create(&out_path).map_err(|e| {
                Error::filesystem(&out_path, format!("Failed to create file: {e}"))
            })?;
            let bytes = std::io::copy(&mut entry, &mut out)?;
            debug!("Extracted {} ({} bytes)", name, bytes);

            extracted.push(out_path);
        }

        Ok(extracted)
    }
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}
