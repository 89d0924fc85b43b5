//! Restore session: package iteration and per-package transfers.
//!
//! A session is created for one ordered list of packages and driven by the
//! host in a fixed sequence:
//!
//! ```text
//! next_package -> transfer_key_value            (key/value package)
//! next_package -> stream_chunk .. NoMoreData    (full-stream package)
//! ...
//! next_package -> NoMorePackages
//! finish
//! ```
//!
//! `abort` may be called at any point of a full-stream transfer. Calling an
//! operation that does not match the selected package's mode is a bug in the
//! caller and panics.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::archive::{contains, ArchiveLayout, ArchiveSource, EntryMatch};
use crate::config::RestoreConfig;
use crate::error::{RestoreError, RestoreResult};
use crate::full::FullStream;
use crate::kv::transfer_records;
use crate::record::RecordSink;
use crate::types::{ChunkResult, NextPackage, RestoreDescription, RestoreMode};

/// Where the iterator stands in the package list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    BeforeFirst,
    At(usize),
    Exhausted,
}

/// State of one restore pass over an archive.
pub struct RestoreSession {
    source: Arc<dyn ArchiveSource>,
    layout: ArchiveLayout,
    chunk_size: usize,
    token: u64,
    packages: Vec<String>,
    cursor: Cursor,
    mode: RestoreMode,
    stream: Option<FullStream>,
}

impl RestoreSession {
    /// Start a session over `packages`, in the given order.
    pub fn start(
        source: Arc<dyn ArchiveSource>,
        config: &RestoreConfig,
        token: u64,
        packages: Vec<String>,
    ) -> Self {
        info!(
            token,
            packages = packages.len(),
            archive = %source.describe(),
            "restore session started"
        );
        Self {
            source,
            layout: ArchiveLayout::from_config(config),
            chunk_size: config.chunk_size,
            token,
            packages,
            cursor: Cursor::BeforeFirst,
            mode: RestoreMode::None,
            stream: None,
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Mode bound to the current package.
    pub fn mode(&self) -> RestoreMode {
        self.mode
    }

    /// Package most recently returned by `next_package`.
    pub fn current_package(&self) -> Option<&str> {
        match self.cursor {
            Cursor::At(index) => Some(self.packages[index].as_str()),
            Cursor::BeforeFirst | Cursor::Exhausted => None,
        }
    }

    /// True while a full-stream transfer holds an archive handle.
    pub fn has_open_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(FullStream::is_open)
    }

    /// Probe the archive for `package` without transferring anything.
    ///
    /// Key/value data wins when both kinds are present.
    pub fn classify(&self, package: &str) -> RestoreResult<RestoreMode> {
        classify(self.source.as_ref(), &self.layout, package)
    }

    /// Advance to the next package that has restorable data.
    ///
    /// Packages whose probe fails are logged and skipped. Once the list is
    /// exhausted every call returns `NoMorePackages`.
    pub fn next_package(&mut self) -> NextPackage {
        if let Some(mut stream) = self.stream.take() {
            if stream.is_open() {
                warn!(package = stream.package(), "releasing unfinished full stream");
                stream.abort();
            }
        }

        let mut index = match self.cursor {
            Cursor::BeforeFirst => 0,
            Cursor::At(index) => index + 1,
            Cursor::Exhausted => return NextPackage::NoMorePackages,
        };

        while index < self.packages.len() {
            self.cursor = Cursor::At(index);
            let package = &self.packages[index];

            match self.classify(package) {
                Ok(RestoreMode::None) => {
                    debug!(package = %package, index, "no data for package");
                }
                Ok(mode) => {
                    info!(
                        package = %package,
                        index,
                        mode = %mode,
                        "selected package for restore"
                    );
                    self.mode = mode;
                    if mode == RestoreMode::FullStream {
                        self.stream = Some(FullStream::new(package.as_str(), self.chunk_size));
                    }
                    return NextPackage::Package(RestoreDescription {
                        package: package.clone(),
                        mode,
                    });
                }
                Err(e) => {
                    warn!(
                        package = %package,
                        index,
                        error = %e,
                        "failed to classify package, skipping"
                    );
                }
            }
            index += 1;
        }

        debug!(token = self.token, "no more packages");
        self.cursor = Cursor::Exhausted;
        self.mode = RestoreMode::None;
        NextPackage::NoMorePackages
    }

    /// Write every record of the current key/value package to `sink`.
    ///
    /// # Panics
    ///
    /// If no package is selected or the current package is not key/value.
    pub fn transfer_key_value<S>(&mut self, sink: &mut S) -> RestoreResult<usize>
    where
        S: RecordSink + ?Sized,
    {
        let Some(package) = self.current_package() else {
            panic!("transfer_key_value() called before next_package()");
        };
        assert_eq!(
            self.mode,
            RestoreMode::KeyValue,
            "transfer_key_value() for non key/value package {package}"
        );

        match transfer_records(self.source.as_ref(), &self.layout, package, sink) {
            Ok(records) => {
                info!(package, records, "key/value restore complete");
                Ok(records)
            }
            Err(e) => {
                error!(package, error = %e, "unable to restore key/value records");
                Err(RestoreError::transfer(package, e))
            }
        }
    }

    /// Move the next chunk of the current full-stream package to `output`.
    ///
    /// # Panics
    ///
    /// If no package is selected or the current package is not full-stream.
    pub fn stream_chunk<W>(&mut self, output: &mut W) -> RestoreResult<ChunkResult>
    where
        W: Write + ?Sized,
    {
        assert_eq!(
            self.mode,
            RestoreMode::FullStream,
            "stream_chunk() for non full-stream package"
        );
        let Some(stream) = self.stream.as_mut() else {
            panic!("stream_chunk() called before next_package()");
        };
        stream.next_chunk(self.source.as_ref(), &self.layout, output)
    }

    /// Release any open full-stream resources. Safe in every state.
    pub fn abort(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.abort();
        }
    }

    /// End the session, releasing anything still open.
    pub fn finish(mut self) {
        if self.mode == RestoreMode::FullStream {
            self.abort();
        }
        info!(token = self.token, "restore session finished");
    }
}

/// Classify one package by probing the archive.
pub fn classify(
    source: &dyn ArchiveSource,
    layout: &ArchiveLayout,
    package: &str,
) -> RestoreResult<RestoreMode> {
    let prefix = layout.incremental_prefix(package);
    if contains(source, EntryMatch::Prefix(&prefix))? {
        return Ok(RestoreMode::KeyValue);
    }
    let path = layout.full_path(package);
    if contains(source, EntryMatch::Exact(&path))? {
        return Ok(RestoreMode::FullStream);
    }
    Ok(RestoreMode::None)
}
