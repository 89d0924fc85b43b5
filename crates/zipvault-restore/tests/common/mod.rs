//! Shared fixtures for restore integration tests.
#![allow(dead_code)]

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};
use zipvault_restore::archive::ArchiveHandle;
use zipvault_restore::{encode_key, ArchiveSource, RecordSink};

/// Builds a zip archive in memory.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a key/value record under `incremental/{package}/`.
    pub fn record(self, package: &str, key: &[u8], value: &[u8]) -> Self {
        let name = format!("incremental/{}/{}", package, encode_key(key));
        self.entry(&name, value, CompressionMethod::Deflated)
    }

    /// Add a full-stream payload, stored uncompressed.
    pub fn full(self, package: &str, payload: &[u8]) -> Self {
        self.entry(&format!("full/{package}"), payload, CompressionMethod::Stored)
    }

    /// Add a full-stream payload, deflated.
    pub fn full_deflated(self, package: &str, payload: &[u8]) -> Self {
        self.entry(&format!("full/{package}"), payload, CompressionMethod::Deflated)
    }

    /// Add a full-stream payload, stored with legacy ZipCrypto encryption.
    pub fn full_encrypted(mut self, package: &str, payload: &[u8], password: &[u8]) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .with_deprecated_encryption(password)
            .unwrap();
        self.writer
            .start_file(format!("full/{package}"), options)
            .unwrap();
        self.writer.write_all(payload).unwrap();
        self
    }

    pub fn entry(mut self, name: &str, data: &[u8], method: CompressionMethod) -> Self {
        let options = SimpleFileOptions::default().compression_method(method);
        self.writer.start_file(name, options).unwrap();
        self.writer.write_all(data).unwrap();
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}

#[derive(Default)]
struct SourceState {
    live: AtomicUsize,
    opens: AtomicUsize,
    fail_opens: AtomicBool,
    fail_next_opens: AtomicUsize,
    fail_reads: AtomicBool,
}

/// In-memory source that tracks open handles and can inject failures.
#[derive(Clone)]
pub struct TrackingSource {
    bytes: Bytes,
    state: Arc<SourceState>,
}

impl TrackingSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(bytes),
            state: Arc::default(),
        }
    }

    /// Handles opened and not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Total handles opened so far.
    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    /// Make every subsequent open fail (or succeed again).
    pub fn fail_opens(&self, fail: bool) {
        self.state.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Make only the next `n` opens fail.
    pub fn fail_next_opens(&self, n: usize) {
        self.state.fail_next_opens.store(n, Ordering::SeqCst);
    }

    /// Make reads on every handle, including already open ones, fail.
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl ArchiveSource for TrackingSource {
    fn open(&self) -> io::Result<ArchiveHandle> {
        let state = &self.state;
        let countdown = state
            .fail_next_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if countdown || state.fail_opens.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "archive unavailable",
            ));
        }
        state.opens.fetch_add(1, Ordering::SeqCst);
        state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedHandle {
            inner: Cursor::new(self.bytes.clone()),
            state: Arc::clone(state),
        }))
    }

    fn describe(&self) -> String {
        "tracking".to_string()
    }
}

struct TrackedHandle {
    inner: Cursor<Bytes>,
    state: Arc<SourceState>,
}

impl Read for TrackedHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(io::Error::other("injected read failure"));
        }
        self.inner.read(buf)
    }
}

impl Seek for TrackedHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for TrackedHandle {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Output that accepts `limit` bytes and then fails.
pub struct FailingWriter {
    pub written: Vec<u8>,
    limit: usize,
}

impl FailingWriter {
    pub fn after(limit: usize) -> Self {
        Self {
            written: Vec::new(),
            limit,
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader closed"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Record sink that collects records and fails on header number `fail_at`.
#[derive(Default)]
pub struct CollectingSink {
    pub records: Vec<(Vec<u8>, Vec<u8>)>,
    pub fail_at: Option<usize>,
    headers: usize,
}

impl CollectingSink {
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }
}

impl RecordSink for CollectingSink {
    fn write_entity_header(&mut self, key: &[u8], _data_len: usize) -> io::Result<()> {
        self.headers += 1;
        if self.fail_at == Some(self.headers) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.records.push((key.to_vec(), Vec::new()));
        Ok(())
    }

    fn write_entity_data(&mut self, data: &[u8]) -> io::Result<()> {
        match self.records.last_mut() {
            Some(record) => {
                record.1 = data.to_vec();
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::InvalidInput, "no header")),
        }
    }
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn packages(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Rewrite the compression method of every entry in `archive`.
///
/// Produces entries the reader cannot stream without needing an encoder
/// for that method.
pub fn patch_compression_method(archive: &mut [u8], method: u16) {
    const LOCAL: [u8; 4] = 0x0403_4b50u32.to_le_bytes();
    const CENTRAL: [u8; 4] = 0x0201_4b50u32.to_le_bytes();
    let mut i = 0;
    while i + 4 <= archive.len() {
        let offset = match &archive[i..i + 4] {
            sig if sig == LOCAL => Some(8),
            sig if sig == CENTRAL => Some(10),
            _ => None,
        };
        if let Some(offset) = offset {
            archive[i + offset..i + offset + 2].copy_from_slice(&method.to_le_bytes());
            i += 4;
        } else {
            i += 1;
        }
    }
}
