//! Key/value record output.
//!
//! Restored records are written in the host's backup-data framing:
//!
//! ```text
//! u32 LE  magic "Data" (0x61746144)
//! u32 LE  key length
//! u32 LE  data length
//! key bytes, NUL, zero padding to a 4-byte boundary
//! data bytes, zero padding to a 4-byte boundary
//! ```

use std::io::{self, Read, Write};

/// Entity header magic, `"Data"` little-endian.
pub const ENTITY_MAGIC: u32 = 0x6174_6144;

const HEADER_LEN: usize = 12;
const MAX_KEY_BYTES: usize = 64 * 1024;
const MAX_VALUE_BYTES: usize = 256 * 1024 * 1024;

/// Destination of restored key/value records.
pub trait RecordSink {
    /// Announce the next record.
    fn write_entity_header(&mut self, key: &[u8], data_len: usize) -> io::Result<()>;

    /// Write the payload announced by the previous header.
    fn write_entity_data(&mut self, data: &[u8]) -> io::Result<()>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write_entity_header(&mut self, key: &[u8], data_len: usize) -> io::Result<()> {
        (**self).write_entity_header(key, data_len)
    }

    fn write_entity_data(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_entity_data(data)
    }
}

/// One restored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Writes records in backup-data framing.
#[derive(Debug)]
pub struct BackupDataWriter<W: Write> {
    inner: W,
    pending: Option<usize>,
    records: usize,
}

impl<W: Write> BackupDataWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: None,
            records: 0,
        }
    }

    /// Number of complete records written.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RecordSink for BackupDataWriter<W> {
    fn write_entity_header(&mut self, key: &[u8], data_len: usize) -> io::Result<()> {
        if self.pending.is_some() {
            return Err(invalid_input("entity header written before previous data"));
        }
        let key_len = u32::try_from(key.len()).map_err(|_| invalid_input("key too long"))?;
        let data_len_u32 =
            u32::try_from(data_len).map_err(|_| invalid_input("record data too long"))?;

        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&ENTITY_MAGIC.to_le_bytes());
        header[4..8].copy_from_slice(&key_len.to_le_bytes());
        header[8..12].copy_from_slice(&data_len_u32.to_le_bytes());
        self.inner.write_all(&header)?;
        self.inner.write_all(key)?;
        self.inner.write_all(&[0u8])?;
        self.inner.write_all(&[0u8; 3][..padding(key.len() + 1)])?;

        self.pending = Some(data_len);
        Ok(())
    }

    fn write_entity_data(&mut self, data: &[u8]) -> io::Result<()> {
        match self.pending {
            Some(len) if len == data.len() => {}
            Some(len) => {
                return Err(invalid_input(format!(
                    "entity data is {} bytes, header declared {}",
                    data.len(),
                    len
                )))
            }
            None => return Err(invalid_input("entity data written without header")),
        }
        self.inner.write_all(data)?;
        self.inner.write_all(&[0u8; 3][..padding(data.len())])?;
        self.inner.flush()?;

        self.pending = None;
        self.records += 1;
        Ok(())
    }
}

/// Parses a backup-data stream back into records.
pub struct BackupDataReader<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> BackupDataReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    fn read_record(&mut self) -> io::Result<Option<Record>> {
        let mut header = [0u8; HEADER_LEN];
        let n = read_full(&mut self.inner, &mut header)?;
        if n == 0 {
            return Ok(None);
        }
        if n < HEADER_LEN {
            return Err(invalid_data("truncated entity header"));
        }

        let magic = le_u32(&header[0..4]);
        if magic != ENTITY_MAGIC {
            return Err(invalid_data(format!("bad entity magic 0x{magic:08x}")));
        }
        let key_len = le_u32(&header[4..8]) as usize;
        let data_len = le_u32(&header[8..12]) as usize;
        if key_len > MAX_KEY_BYTES || data_len > MAX_VALUE_BYTES {
            return Err(invalid_data("entity exceeds size limits"));
        }

        let mut key = vec![0u8; key_len + 1 + padding(key_len + 1)];
        self.inner.read_exact(&mut key)?;
        if key[key_len] != 0 {
            return Err(invalid_data("entity key is not NUL terminated"));
        }
        key.truncate(key_len);

        let mut value = vec![0u8; data_len + padding(data_len)];
        self.inner.read_exact(&mut value)?;
        value.truncate(data_len);

        Ok(Some(Record { key, value }))
    }
}

impl<R: Read> Iterator for BackupDataReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Like `read_exact`, but reports how much was read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn invalid_input(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.into())
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
