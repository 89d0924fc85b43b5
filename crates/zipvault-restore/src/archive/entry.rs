//! Owned payload reader for a single archive entry.
//!
//! The zip crate hands out entry readers that borrow the archive, which
//! cannot be kept across calls. A full-stream transfer instead takes the
//! handle back from the archive, seeks it to the entry data and reads the
//! payload directly. The cursor owns the handle; dropping it closes both.
//!
//! Supported: stored (method 0) and deflate (method 8) entries. Encrypted
//! entries are refused.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Take};

use flate2::read::DeflateDecoder;
use zip::CompressionMethod;

use crate::archive::source::ArchiveHandle;
use crate::error::{RestoreError, RestoreResult};

const SIG_LFH: u32 = 0x0403_4b50;
/// Local file header fixed length.
const LFH_LEN: usize = 30;

/// Location of an entry's payload, taken from the central directory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadSpan {
    pub header_start: u64,
    pub compressed_size: u64,
    pub method: CompressionMethod,
    pub encrypted: bool,
}

/// Decompressing reader over one entry payload.
pub enum EntryCursor {
    Stored(Take<ArchiveHandle>),
    Deflated(DeflateDecoder<Take<ArchiveHandle>>),
}

impl EntryCursor {
    /// Position `handle` at the payload described by `span`.
    pub fn open(mut handle: ArchiveHandle, path: &str, span: PayloadSpan) -> RestoreResult<Self> {
        if span.encrypted {
            return Err(RestoreError::EncryptedEntry {
                path: path.to_string(),
            });
        }
        if !matches!(
            span.method,
            CompressionMethod::Stored | CompressionMethod::Deflated
        ) {
            return Err(RestoreError::UnsupportedCompression {
                path: path.to_string(),
                method: format!("{:?}", span.method),
            });
        }

        handle.seek(SeekFrom::Start(span.header_start))?;
        let mut lfh = [0u8; LFH_LEN];
        handle.read_exact(&mut lfh)?;

        let sig = u32::from_le_bytes([lfh[0], lfh[1], lfh[2], lfh[3]]);
        if sig != SIG_LFH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad local header signature for {path}"),
            )
            .into());
        }

        let name_len = u64::from(u16::from_le_bytes([lfh[26], lfh[27]]));
        let extra_len = u64::from(u16::from_le_bytes([lfh[28], lfh[29]]));
        let data_start = span.header_start + LFH_LEN as u64 + name_len + extra_len;

        handle.seek(SeekFrom::Start(data_start))?;
        let payload = handle.take(span.compressed_size);

        Ok(match span.method {
            CompressionMethod::Stored => Self::Stored(payload),
            _ => Self::Deflated(DeflateDecoder::new(payload)),
        })
    }

    /// Read until `buf` is full or the payload ends.
    ///
    /// Returns 0 only at end of payload.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl Read for EntryCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Stored(r) => r.read(buf),
            Self::Deflated(r) => r.read(buf),
        }
    }
}

impl fmt::Debug for EntryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored(r) => f.debug_tuple("Stored").field(&r.limit()).finish(),
            Self::Deflated(r) => f.debug_tuple("Deflated").field(&r.get_ref().limit()).finish(),
        }
    }
}
