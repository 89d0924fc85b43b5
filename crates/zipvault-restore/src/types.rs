//! Caller-visible values of the restore protocol.

use std::fmt;

/// How a package's data is stored in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreMode {
    /// Not classified yet.
    #[default]
    None,
    /// Discrete key/value records under `incremental/<package>/`.
    KeyValue,
    /// One opaque byte stream at `full/<package>`.
    FullStream,
}

impl RestoreMode {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::KeyValue => "key-value",
            Self::FullStream => "full-stream",
        }
    }
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A package selected for restore together with its mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreDescription {
    pub package: String,
    pub mode: RestoreMode,
}

/// Result of advancing the package iterator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPackage {
    Package(RestoreDescription),
    NoMorePackages,
}

impl NextPackage {
    /// The selected package, if any.
    pub fn description(&self) -> Option<&RestoreDescription> {
        match self {
            Self::Package(desc) => Some(desc),
            Self::NoMorePackages => None,
        }
    }
}

/// Result of one full-stream chunk step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkResult {
    /// This many bytes were written to the output.
    Data(usize),
    /// The stream is exhausted; resources have been released.
    NoMoreData,
}

/// Status codes of the host pull protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Ok,
    Error,
    PackageRejected,
    NoMoreData,
}

impl TransportStatus {
    /// Wire value used by the host.
    pub const fn code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Error => -1000,
            Self::PackageRejected => -1002,
            Self::NoMoreData => -1,
        }
    }
}

/// Descriptor of a restore set offered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSet {
    pub name: String,
    pub device: String,
    pub token: u64,
}

impl RestoreSet {
    /// Token of the single local restore set.
    pub const DEFAULT_TOKEN: u64 = 1;

    /// The single local restore set backed by the archive.
    pub fn local() -> Self {
        Self {
            name: "Local disk image".to_string(),
            device: "flash".to_string(),
            token: Self::DEFAULT_TOKEN,
        }
    }
}

impl Default for RestoreSet {
    fn default() -> Self {
        Self::local()
    }
}
