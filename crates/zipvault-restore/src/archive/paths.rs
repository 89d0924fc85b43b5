//! Entry naming conventions inside the archive.

use crate::config::RestoreConfig;

/// Directory layout of a backup archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    incremental_dir: String,
    full_dir: String,
}

impl ArchiveLayout {
    /// Create a layout. Directory names are normalized to end in `/`.
    pub fn new(incremental_dir: impl Into<String>, full_dir: impl Into<String>) -> Self {
        Self {
            incremental_dir: with_trailing_slash(incremental_dir.into()),
            full_dir: with_trailing_slash(full_dir.into()),
        }
    }

    pub fn from_config(config: &RestoreConfig) -> Self {
        Self::new(config.incremental_dir.clone(), config.full_dir.clone())
    }

    /// Prefix shared by every record of a package.
    ///
    /// Returns: `{incremental}/{package}/`
    ///
    /// The trailing separator keeps `com.a` from matching `com.ab`.
    pub fn incremental_prefix(&self, package: &str) -> String {
        format!("{}{}/", self.incremental_dir, package)
    }

    /// Entry name of a single record.
    ///
    /// Returns: `{incremental}/{package}/{encoded_key}`
    pub fn record_path(&self, package: &str, encoded_key: &str) -> String {
        format!("{}{}", self.incremental_prefix(package), encoded_key)
    }

    /// Entry name of a package's full stream.
    ///
    /// Returns: `{full}/{package}`
    pub fn full_path(&self, package: &str) -> String {
        format!("{}{}", self.full_dir, package)
    }

    /// Final path segment of an entry name (the encoded record key).
    pub fn record_name(entry_name: &str) -> &str {
        entry_name.rsplit('/').next().unwrap_or(entry_name)
    }
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self::from_config(&RestoreConfig::default())
    }
}

fn with_trailing_slash(mut dir: String) -> String {
    if !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}
