//! Host-facing restore transport.
//!
//! Wraps [`RestoreSession`] in the call surface the backup host expects:
//! at most one session at a time, status codes instead of errors, and
//! panics on calls made out of sequence.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::archive::ArchiveSource;
use crate::config::RestoreConfig;
use crate::error::RestoreResult;
use crate::record::RecordSink;
use crate::session::RestoreSession;
use crate::types::{ChunkResult, NextPackage, RestoreSet, TransportStatus};

/// Restore side of the transport, bound to one archive.
pub struct RestoreTransport {
    source: Arc<dyn ArchiveSource>,
    config: RestoreConfig,
    session: Option<RestoreSession>,
}

impl RestoreTransport {
    /// Create a transport. Fails if `config` is invalid.
    pub fn new(source: Arc<dyn ArchiveSource>, config: RestoreConfig) -> RestoreResult<Self> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            session: None,
        })
    }

    pub fn config(&self) -> &RestoreConfig {
        &self.config
    }

    /// The active session, if `start` has been called.
    pub fn session(&self) -> Option<&RestoreSession> {
        self.session.as_ref()
    }

    /// Restore sets this transport can offer.
    pub fn available_restore_sets(&self) -> Vec<RestoreSet> {
        vec![self.config.restore_set.clone()]
    }

    /// Token of the restore set in use.
    pub fn current_restore_set(&self) -> u64 {
        self.config.restore_set.token
    }

    /// Begin restoring `packages` from the restore set `token`.
    pub fn start(&mut self, token: u64, packages: Vec<String>) -> TransportStatus {
        if let Some(previous) = self.session.take() {
            warn!(token = previous.token(), "replacing unfinished restore session");
            previous.finish();
        }
        self.session = Some(RestoreSession::start(
            Arc::clone(&self.source),
            &self.config,
            token,
            packages,
        ));
        TransportStatus::Ok
    }

    /// Select the next package with data.
    ///
    /// # Panics
    ///
    /// If `start` has not been called.
    pub fn next_package(&mut self) -> NextPackage {
        self.active("next_package").next_package()
    }

    /// Write all records of the current key/value package.
    ///
    /// # Panics
    ///
    /// If `start`/`next` have not been called or the package is not key/value.
    pub fn transfer_key_value<S>(&mut self, sink: &mut S) -> TransportStatus
    where
        S: RecordSink + ?Sized,
    {
        match self.active("transfer_key_value").transfer_key_value(sink) {
            Ok(_) => TransportStatus::Ok,
            Err(e) => e.status(),
        }
    }

    /// Pull one chunk of the current full-stream package.
    ///
    /// # Panics
    ///
    /// If `start`/`next` have not been called or the package is not full-stream.
    pub fn stream_chunk<W>(&mut self, output: &mut W) -> Result<ChunkResult, TransportStatus>
    where
        W: Write + ?Sized,
    {
        self.active("stream_chunk")
            .stream_chunk(output)
            .map_err(|e| e.status())
    }

    /// Abandon the current full-stream transfer.
    pub fn abort(&mut self) -> TransportStatus {
        match self.session.as_mut() {
            Some(session) => session.abort(),
            None => debug!("abort() without an active session"),
        }
        TransportStatus::Ok
    }

    /// End the session, releasing anything still open.
    ///
    /// # Panics
    ///
    /// If `start` has not been called.
    pub fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            panic!("finish() called before start()");
        };
        session.finish();
    }

    fn active(&mut self, op: &str) -> &mut RestoreSession {
        match self.session.as_mut() {
            Some(session) => session,
            None => panic!("{op}() called before start()"),
        }
    }
}

/// Wire value of a chunk call: byte count, or a negative status code.
pub fn chunk_code(result: &Result<ChunkResult, TransportStatus>) -> i32 {
    match result {
        Ok(ChunkResult::Data(n)) => i32::try_from(*n).unwrap_or(i32::MAX),
        Ok(ChunkResult::NoMoreData) => TransportStatus::NoMoreData.code(),
        Err(status) => status.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ArchiveBuilder;
    use crate::types::RestoreMode;

    fn transport() -> RestoreTransport {
        let source = ArchiveBuilder::new()
            .stored("full/com.full", &[9u8; 10])
            .into_source();
        RestoreTransport::new(Arc::new(source), RestoreConfig::default()).unwrap()
    }

    #[test]
    fn test_restore_sets() {
        let t = transport();
        assert_eq!(t.current_restore_set(), 1);
        assert_eq!(t.config().restore_set.token, t.current_restore_set());
        let sets = t.available_restore_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "Local disk image");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RestoreConfig {
            chunk_size: 0,
            ..RestoreConfig::default()
        };
        let source = ArchiveBuilder::new().into_source();
        assert!(RestoreTransport::new(Arc::new(source), config).is_err());
    }

    #[test]
    fn test_full_protocol_codes() {
        let mut t = transport();
        assert_eq!(t.start(1, vec!["com.full".to_string()]), TransportStatus::Ok);

        let desc = t.next_package().description().cloned().unwrap();
        assert_eq!(desc.mode, RestoreMode::FullStream);

        let mut out = Vec::new();
        assert_eq!(chunk_code(&t.stream_chunk(&mut out)), 10);
        assert_eq!(chunk_code(&t.stream_chunk(&mut out)), -1);
        assert_eq!(t.next_package(), NextPackage::NoMorePackages);
        t.finish();
        assert!(t.session().is_none());
    }

    #[test]
    fn test_chunk_codes() {
        assert_eq!(chunk_code(&Ok(ChunkResult::Data(2048))), 2048);
        assert_eq!(chunk_code(&Ok(ChunkResult::NoMoreData)), -1);
        assert_eq!(chunk_code(&Err(TransportStatus::PackageRejected)), -1002);
        assert_eq!(chunk_code(&Err(TransportStatus::Error)), -1000);
    }

    #[test]
    fn test_start_replaces_previous_session() {
        let mut t = transport();
        t.start(1, vec!["com.full".to_string()]);
        t.next_package();
        t.stream_chunk(&mut Vec::new()).unwrap();

        t.start(2, vec![]);
        let session = t.session().unwrap();
        assert_eq!(session.token(), 2);
        assert!(session.packages().is_empty());
        assert!(!session.has_open_stream());
    }

    #[test]
    fn test_abort_without_session_is_ok() {
        let mut t = transport();
        assert_eq!(t.abort(), TransportStatus::Ok);
    }

    #[test]
    #[should_panic(expected = "next_package() called before start()")]
    fn test_next_before_start_panics() {
        transport().next_package();
    }

    #[test]
    #[should_panic(expected = "finish() called before start()")]
    fn test_finish_before_start_panics() {
        transport().finish();
    }
}
