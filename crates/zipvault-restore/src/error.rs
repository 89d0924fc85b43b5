//! Error types for restore operations.

use thiserror::Error;

use crate::types::TransportStatus;

/// Result type for restore operations.
pub type RestoreResult<T> = Result<T, RestoreError>;

/// Errors that can occur while probing or transferring restore data.
///
/// Sequencing violations (calling an operation out of protocol order) are
/// not represented here; they panic.
#[derive(Debug, Error)]
pub enum RestoreError {
    /// Reading the archive or writing the caller's output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a readable zip container.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An incremental entry name is not a valid encoded record key.
    #[error("invalid record key '{name}': {reason}")]
    KeyDecode { name: String, reason: String },

    /// The full-stream entry for a package is missing or unusable.
    #[error("package rejected: {package}")]
    PackageRejected { package: String },

    /// The full-stream entry uses a compression method we cannot stream.
    #[error("unsupported compression for {path}: {method}")]
    UnsupportedCompression { path: String, method: String },

    /// The full-stream entry is encrypted and cannot be read as plaintext.
    #[error("encrypted entry not supported: {path}")]
    EncryptedEntry { path: String },

    /// A transfer for a selected package failed part way.
    #[error("transfer failed for {package}: {source}")]
    Transfer {
        package: String,
        #[source]
        source: Box<RestoreError>,
    },

    /// Invalid restore configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl RestoreError {
    /// Wrap an error raised while moving data for `package`.
    pub fn transfer(package: impl Into<String>, source: impl Into<RestoreError>) -> Self {
        Self::Transfer {
            package: package.into(),
            source: Box::new(source.into()),
        }
    }

    /// Returns true if the package was rejected rather than failed.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::PackageRejected { .. }
                | Self::UnsupportedCompression { .. }
                | Self::EncryptedEntry { .. }
        )
    }

    /// Returns true if data was being moved when the error happened.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }

    /// Status code reported to the host for this error.
    pub fn status(&self) -> TransportStatus {
        if self.is_rejected() {
            TransportStatus::PackageRejected
        } else {
            TransportStatus::Error
        }
    }
}
