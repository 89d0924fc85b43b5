//! In-memory archive fixtures for unit tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::source::MemoryArchive;

pub(crate) struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveBuilder {
    pub(crate) fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    pub(crate) fn directory(mut self, name: &str) -> Self {
        self.writer
            .add_directory(name, SimpleFileOptions::default())
            .unwrap();
        self
    }

    pub(crate) fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, CompressionMethod::Stored)
    }

    pub(crate) fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data, CompressionMethod::Deflated)
    }

    fn entry(mut self, name: &str, data: &[u8], method: CompressionMethod) -> Self {
        let options = SimpleFileOptions::default().compression_method(method);
        self.writer.start_file(name, options).unwrap();
        self.writer.write_all(data).unwrap();
        self
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }

    pub(crate) fn into_source(self) -> MemoryArchive {
        MemoryArchive::new(self.into_bytes())
    }
}
