//! Linear entry lookup.
//!
//! Lookups walk the central directory in archive order and stop at the first
//! matching entry. Skipped entries are never decompressed.

use std::io::Read;

use tracing::debug;
use zip::ZipArchive;

use crate::archive::entry::{EntryCursor, PayloadSpan};
use crate::archive::source::{ArchiveHandle, ArchiveSource};
use crate::error::RestoreResult;

/// Preallocation cap for record payloads; sizes in the directory are untrusted.
const MAX_PREALLOC: u64 = 1024 * 1024;

/// How an entry name is compared during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMatch<'a> {
    /// Name starts with the given prefix.
    Prefix(&'a str),
    /// Name equals the given path.
    Exact(&'a str),
}

impl EntryMatch<'_> {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix),
            Self::Exact(path) => name == *path,
        }
    }

    fn pattern(&self) -> &str {
        match self {
            Self::Prefix(p) | Self::Exact(p) => p,
        }
    }
}

/// An entry found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEntry {
    /// Position in archive order.
    pub index: usize,
    pub name: String,
}

/// One open read handle over the archive.
pub struct OpenArchive {
    zip: ZipArchive<ArchiveHandle>,
}

impl OpenArchive {
    /// Open a fresh handle from `source` and read the entry directory.
    pub fn open(source: &dyn ArchiveSource) -> RestoreResult<Self> {
        let handle = source.open()?;
        let zip = ZipArchive::new(handle)?;
        Ok(Self { zip })
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Find the first matching entry at or after position `start`.
    ///
    /// Directory entries never match.
    pub fn find_from(
        &mut self,
        start: usize,
        matcher: EntryMatch<'_>,
    ) -> RestoreResult<Option<LocatedEntry>> {
        for index in start..self.zip.len() {
            let entry = self.zip.by_index_raw(index)?;
            if entry.is_dir() {
                continue;
            }
            if matcher.matches(entry.name()) {
                return Ok(Some(LocatedEntry {
                    index,
                    name: entry.name().to_string(),
                }));
            }
        }
        Ok(None)
    }

    /// Read a located entry's payload fully into memory.
    pub fn read_entry(&mut self, entry: &LocatedEntry) -> RestoreResult<Vec<u8>> {
        let mut file = self.zip.by_index(entry.index)?;
        let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Give up the directory and keep the handle as a cursor over `entry`.
    pub fn into_cursor(mut self, entry: &LocatedEntry) -> RestoreResult<EntryCursor> {
        let span = {
            let file = self.zip.by_index_raw(entry.index)?;
            PayloadSpan {
                header_start: file.header_start(),
                compressed_size: file.compressed_size(),
                method: file.compression(),
                encrypted: file.encrypted(),
            }
        };
        EntryCursor::open(self.zip.into_inner(), &entry.name, span)
    }
}

/// Open `source` from the start and scan for the first matching entry.
///
/// On a match the handle stays open and is returned with the entry. On a
/// miss the handle is dropped before returning.
pub fn locate(
    source: &dyn ArchiveSource,
    matcher: EntryMatch<'_>,
) -> RestoreResult<Option<(OpenArchive, LocatedEntry)>> {
    let mut archive = OpenArchive::open(source)?;
    let found = archive.find_from(0, matcher)?;
    debug!(
        pattern = matcher.pattern(),
        found = found.is_some(),
        entries = archive.len(),
        "archive scan"
    );
    Ok(found.map(|entry| (archive, entry)))
}

/// Probe for a matching entry. The handle is closed before returning.
pub fn contains(source: &dyn ArchiveSource, matcher: EntryMatch<'_>) -> RestoreResult<bool> {
    Ok(locate(source, matcher)?.is_some())
}
