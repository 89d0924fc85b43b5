//! Resumable full-stream transfer.
//!
//! The host pulls a package's stream one chunk per call. The open archive
//! handle and payload cursor live in [`FullStream`] between calls:
//!
//! ```text
//! NotStarted --first call, entry found--> Streaming --end of payload--> Closed(Exhausted)
//!     |                                       |--read/write failure--> Closed(Failed)
//!     +--entry missing--> Closed(Rejected)    +--abort--------------> Closed(Aborted)
//! ```
//!
//! Every transition into `Closed` drops the cursor, which closes the handle.

use std::io::Write;

use tracing::{debug, error, info, warn};

use crate::archive::{locate, ArchiveLayout, ArchiveSource, EntryCursor, EntryMatch};
use crate::error::{RestoreError, RestoreResult};
use crate::types::ChunkResult;

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Exhausted,
    Rejected,
    Failed,
    Aborted,
}

#[derive(Debug)]
enum StreamPhase {
    NotStarted,
    Streaming(EntryCursor),
    Closed(CloseReason),
}

/// Chunked transfer state for one full-stream package.
#[derive(Debug)]
pub struct FullStream {
    package: String,
    phase: StreamPhase,
    buffer: Vec<u8>,
    streamed: u64,
    chunks: u64,
}

impl FullStream {
    /// Prepare a transfer. Nothing is opened until the first chunk call.
    pub fn new(package: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            package: package.into(),
            phase: StreamPhase::NotStarted,
            buffer: vec![0u8; chunk_size],
            streamed: 0,
            chunks: 0,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// True while an archive handle is held.
    pub fn is_open(&self) -> bool {
        matches!(self.phase, StreamPhase::Streaming(_))
    }

    /// Reason the stream closed, if it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        match self.phase {
            StreamPhase::Closed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Payload bytes delivered so far.
    pub fn bytes_streamed(&self) -> u64 {
        self.streamed
    }

    /// Move at most one chunk from the archive into `output`.
    ///
    /// The first call opens the archive. `output` is only borrowed for the
    /// call; it is flushed when the stream ends.
    pub fn next_chunk<W>(
        &mut self,
        source: &dyn ArchiveSource,
        layout: &ArchiveLayout,
        output: &mut W,
    ) -> RestoreResult<ChunkResult>
    where
        W: Write + ?Sized,
    {
        match self.phase {
            StreamPhase::NotStarted => self.open(source, layout)?,
            StreamPhase::Streaming(_) => {}
            StreamPhase::Closed(CloseReason::Exhausted) => return Ok(ChunkResult::NoMoreData),
            StreamPhase::Closed(CloseReason::Rejected) => return Err(self.rejected()),
            StreamPhase::Closed(reason) => {
                return Err(RestoreError::transfer(
                    self.package.as_str(),
                    std::io::Error::other(format!("stream is closed ({reason:?})")),
                ))
            }
        }
        self.step(output)
    }

    /// Release the handle, whatever the current phase.
    pub fn abort(&mut self) {
        if self.is_open() {
            info!(
                package = %self.package,
                bytes = self.streamed,
                chunks = self.chunks,
                "full restore aborted"
            );
            self.phase = StreamPhase::Closed(CloseReason::Aborted);
        } else if matches!(self.phase, StreamPhase::NotStarted) {
            self.phase = StreamPhase::Closed(CloseReason::Aborted);
        }
    }

    fn open(&mut self, source: &dyn ArchiveSource, layout: &ArchiveLayout) -> RestoreResult<()> {
        let path = layout.full_path(&self.package);
        let opened = locate(source, EntryMatch::Exact(&path)).and_then(|found| {
            found
                .map(|(archive, entry)| archive.into_cursor(&entry))
                .transpose()
        });

        match opened {
            Ok(Some(cursor)) => {
                debug!(package = %self.package, entry = %path, "opened full stream");
                self.phase = StreamPhase::Streaming(cursor);
                Ok(())
            }
            Ok(None) => {
                warn!(package = %self.package, entry = %path, "no full stream in archive");
                self.phase = StreamPhase::Closed(CloseReason::Rejected);
                Err(self.rejected())
            }
            Err(e) => {
                warn!(package = %self.package, error = %e, "unable to open full stream");
                self.phase = StreamPhase::Closed(CloseReason::Rejected);
                if e.is_rejected() {
                    Err(e)
                } else {
                    Err(self.rejected())
                }
            }
        }
    }

    fn step<W>(&mut self, output: &mut W) -> RestoreResult<ChunkResult>
    where
        W: Write + ?Sized,
    {
        let StreamPhase::Streaming(cursor) = &mut self.phase else {
            unreachable!("step() outside streaming phase");
        };

        let read = match cursor.read_chunk(&mut self.buffer) {
            Ok(n) => n,
            Err(e) => return Err(self.fail(e)),
        };

        if read == 0 {
            // Close before flushing so the handle is released either way.
            self.phase = StreamPhase::Closed(CloseReason::Exhausted);
            if let Err(e) = output.flush() {
                self.phase = StreamPhase::Closed(CloseReason::Failed);
                return Err(RestoreError::transfer(self.package.as_str(), e));
            }
            info!(
                package = %self.package,
                bytes = self.streamed,
                chunks = self.chunks,
                "full restore complete"
            );
            return Ok(ChunkResult::NoMoreData);
        }

        if let Err(e) = output.write_all(&self.buffer[..read]) {
            return Err(self.fail(e));
        }
        self.streamed += read as u64;
        self.chunks += 1;
        debug!(package = %self.package, bytes = read, "streamed chunk");
        Ok(ChunkResult::Data(read))
    }

    fn fail(&mut self, e: std::io::Error) -> RestoreError {
        error!(package = %self.package, error = %e, "full restore failed");
        self.phase = StreamPhase::Closed(CloseReason::Failed);
        RestoreError::transfer(self.package.as_str(), e)
    }

    fn rejected(&self) -> RestoreError {
        RestoreError::PackageRejected {
            package: self.package.clone(),
        }
    }
}
