//! Where archive bytes come from.
//!
//! Acquisition (download, decryption, URI resolution) happens outside this
//! crate. A source only has to hand out independent read handles that start
//! at offset zero.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

/// A seekable read handle over the whole archive.
pub trait ArchiveRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> ArchiveRead for T {}

/// Owned archive handle. Dropping it closes the handle.
pub type ArchiveHandle = Box<dyn ArchiveRead>;

/// Supplier of fresh archive handles.
pub trait ArchiveSource: Send + Sync {
    /// Open a new handle positioned at the start of the archive.
    ///
    /// Handles are independent: reading one never moves another.
    fn open(&self) -> io::Result<ArchiveHandle>;

    /// Short description used in log lines.
    fn describe(&self) -> String {
        "archive".to_string()
    }
}

impl<S: ArchiveSource + ?Sized> ArchiveSource for Arc<S> {
    fn open(&self) -> io::Result<ArchiveHandle> {
        (**self).open()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Archive stored as a file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileArchive {
    path: PathBuf,
}

impl FileArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArchiveSource for FileArchive {
    fn open(&self) -> io::Result<ArchiveHandle> {
        let file = File::open(&self.path)?;
        Ok(Box::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Archive already held in memory.
#[derive(Clone)]
pub struct MemoryArchive {
    bytes: Bytes,
}

impl MemoryArchive {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for MemoryArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryArchive")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ArchiveSource for MemoryArchive {
    fn open(&self) -> io::Result<ArchiveHandle> {
        // Bytes clones share the buffer.
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }

    fn describe(&self) -> String {
        format!("memory ({} bytes)", self.bytes.len())
    }
}
