//! Restore side of a zip-backed backup transport.
//!
//! A backup archive holds per-package key/value records under
//! `incremental/{package}/` and opaque full-stream payloads under
//! `full/{package}`. This crate walks a requested package list, decides how
//! each package is restored, and hands the data to the backup host:
//!
//! - key/value packages in one synchronous call, as backup-data records
//! - full-stream packages one chunk per call, resumable across calls
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipvault_restore::{
//!     BackupDataWriter, ChunkResult, FileArchive, NextPackage, RestoreConfig, RestoreMode,
//!     RestoreTransport,
//! };
//!
//! # fn example() -> zipvault_restore::RestoreResult<()> {
//! let source = Arc::new(FileArchive::new("backup.zip"));
//! let mut transport = RestoreTransport::new(source, RestoreConfig::default())?;
//!
//! transport.start(1, vec!["com.example.notes".to_string()]);
//! while let NextPackage::Package(desc) = transport.next_package() {
//!     match desc.mode {
//!         RestoreMode::KeyValue => {
//!             let mut sink = BackupDataWriter::new(Vec::new());
//!             transport.transfer_key_value(&mut sink);
//!         }
//!         RestoreMode::FullStream => {
//!             let mut out = Vec::new();
//!             while let Ok(ChunkResult::Data(_)) = transport.stream_chunk(&mut out) {}
//!         }
//!         RestoreMode::None => {}
//!     }
//! }
//! transport.finish();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ZIPVAULT_CHUNK_SIZE` | Full-stream chunk size in bytes (default: 2048) |
//! | `ZIPVAULT_INCREMENTAL_DIR` | Key/value directory in the archive (default: `incremental/`) |
//! | `ZIPVAULT_FULL_DIR` | Full-stream directory in the archive (default: `full/`) |

pub mod archive;
pub mod config;
pub mod error;
pub mod full;
pub mod kv;
pub mod record;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_util;

// Convenience re-exports
pub use archive::{
    decode_key, encode_key, ArchiveLayout, ArchiveSource, FileArchive, MemoryArchive,
};
pub use config::{RestoreConfig, RestoreConfigOverrides};
pub use error::{RestoreError, RestoreResult};
pub use full::{CloseReason, FullStream};
pub use record::{BackupDataReader, BackupDataWriter, Record, RecordSink};
pub use session::{classify, RestoreSession};
pub use transport::{chunk_code, RestoreTransport};
pub use types::{
    ChunkResult, NextPackage, RestoreDescription, RestoreMode, RestoreSet, TransportStatus,
};
