//! Read-only access to the backup archive.
//!
//! The archive is a zip container with two top-level directories:
//!
//! ```text
//! incremental/{package}/{encoded_key}   # one entry per key/value record
//! full/{package}                        # at most one opaque stream per package
//! ```
//!
//! Every lookup opens a fresh handle from an [`ArchiveSource`] and scans
//! entries in archive order. There is no persistent index.

pub mod entry;
pub mod key;
pub mod paths;
pub mod scan;
pub mod source;

pub use entry::EntryCursor;
pub use key::{decode_key, encode_key};
pub use paths::ArchiveLayout;
pub use scan::{contains, locate, EntryMatch, LocatedEntry, OpenArchive};
pub use source::{ArchiveHandle, ArchiveRead, ArchiveSource, FileArchive, MemoryArchive};
