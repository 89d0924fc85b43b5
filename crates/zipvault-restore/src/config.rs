//! Restore configuration.
//!
//! Defaults cover the standard archive layout. Overrides can come from a YAML
//! file and from the environment:
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ZIPVAULT_CHUNK_SIZE` | Full-stream chunk size in bytes (default: 2048) |
//! | `ZIPVAULT_INCREMENTAL_DIR` | Key/value directory (default: `incremental/`) |
//! | `ZIPVAULT_FULL_DIR` | Full-stream directory (default: `full/`) |

use std::path::Path;

use serde::Deserialize;

use crate::error::{RestoreError, RestoreResult};
use crate::types::RestoreSet;

pub const DEFAULT_CHUNK_SIZE: usize = 2048;
pub const DEFAULT_INCREMENTAL_DIR: &str = "incremental/";
pub const DEFAULT_FULL_DIR: &str = "full/";

pub const ENV_CHUNK_SIZE: &str = "ZIPVAULT_CHUNK_SIZE";
pub const ENV_INCREMENTAL_DIR: &str = "ZIPVAULT_INCREMENTAL_DIR";
pub const ENV_FULL_DIR: &str = "ZIPVAULT_FULL_DIR";

/// Settings shared by every session of a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreConfig {
    /// Upper bound on bytes written by one full-stream chunk call.
    pub chunk_size: usize,
    /// Directory holding `<package>/<encoded-key>` records.
    pub incremental_dir: String,
    /// Directory holding one `<package>` stream per package.
    pub full_dir: String,
    /// The restore set offered to the host.
    pub restore_set: RestoreSet,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            incremental_dir: DEFAULT_INCREMENTAL_DIR.to_string(),
            full_dir: DEFAULT_FULL_DIR.to_string(),
            restore_set: RestoreSet::local(),
        }
    }
}

/// Partial overrides for `RestoreConfig`. Used for YAML/env parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestoreConfigOverrides {
    pub chunk_size: Option<usize>,
    pub incremental_dir: Option<String>,
    pub full_dir: Option<String>,
}

impl RestoreConfig {
    /// Apply overrides onto this config. Only `Some` values override.
    pub fn apply(self, overrides: RestoreConfigOverrides) -> Self {
        Self {
            chunk_size: overrides.chunk_size.unwrap_or(self.chunk_size),
            incremental_dir: overrides.incremental_dir.unwrap_or(self.incremental_dir),
            full_dir: overrides.full_dir.unwrap_or(self.full_dir),
            restore_set: self.restore_set,
        }
    }

    /// Check that the config can drive a session.
    pub fn validate(&self) -> RestoreResult<()> {
        if self.chunk_size == 0 {
            return Err(config_error("chunk_size must be greater than zero"));
        }
        for (field, dir) in [
            ("incremental_dir", &self.incremental_dir),
            ("full_dir", &self.full_dir),
        ] {
            if dir.is_empty() || !dir.ends_with('/') || dir == "/" {
                return Err(config_error(format!(
                    "{field} must be a non-empty directory ending in '/', got '{dir}'"
                )));
            }
        }
        if self.incremental_dir == self.full_dir {
            return Err(config_error("incremental_dir and full_dir must differ"));
        }
        Ok(())
    }
}

impl RestoreConfigOverrides {
    /// Parse overrides from YAML text.
    pub fn from_yaml_str(yaml: &str) -> RestoreResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| config_error(format!("invalid config: {e}")))
    }

    /// Parse overrides from a YAML file.
    pub fn from_file(path: &Path) -> RestoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            config_error(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> RestoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> RestoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chunk_size = match lookup(ENV_CHUNK_SIZE) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|e| {
                config_error(format!("{ENV_CHUNK_SIZE}='{raw}' is not a byte count: {e}"))
            })?),
            None => None,
        };
        Ok(Self {
            chunk_size,
            incremental_dir: lookup(ENV_INCREMENTAL_DIR),
            full_dir: lookup(ENV_FULL_DIR),
        })
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            chunk_size: other.chunk_size.or(self.chunk_size),
            incremental_dir: other.incremental_dir.or(self.incremental_dir),
            full_dir: other.full_dir.or(self.full_dir),
        }
    }
}

fn config_error(message: impl Into<String>) -> RestoreError {
    RestoreError::Config {
        message: message.into(),
    }
}
