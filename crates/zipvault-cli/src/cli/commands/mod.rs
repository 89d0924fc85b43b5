use std::sync::Arc;

use anyhow::{bail, Context};
use zipvault_restore::{FileArchive, RestoreConfig, RestoreConfigOverrides, RestoreTransport};

use super::args::{Cli, Command, SourceArgs};

pub mod dump;
pub mod list;
pub mod restore;
pub mod sets;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Sets(args) => sets::run(args),
        Command::List(args) => list::run(args),
        Command::Restore(args) => restore::run(args),
        Command::Dump(args) => dump::run(args),
    }
}

/// Resolve restore settings: defaults, then config file, then environment,
/// then command-line flags.
pub(crate) fn load_config(args: &SourceArgs) -> anyhow::Result<RestoreConfig> {
    let mut overrides = RestoreConfigOverrides::default();
    if let Some(path) = &args.config {
        let from_file = RestoreConfigOverrides::from_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?;
        overrides = overrides.merge(from_file);
    }
    overrides = overrides.merge(RestoreConfigOverrides::from_env()?);
    if args.chunk_size.is_some() {
        overrides = overrides.merge(RestoreConfigOverrides {
            chunk_size: args.chunk_size,
            ..RestoreConfigOverrides::default()
        });
    }

    let config = RestoreConfig::default().apply(overrides);
    config.validate()?;
    Ok(config)
}

/// Open a transport over the archive named on the command line.
pub(crate) fn open_transport(args: &SourceArgs) -> anyhow::Result<RestoreTransport> {
    if !args.archive.is_file() {
        bail!("archive not found: {}", args.archive.display());
    }
    let config = load_config(args)?;
    let source = Arc::new(FileArchive::new(&args.archive));
    let transport = RestoreTransport::new(source, config)
        .with_context(|| format!("failed to open archive: {}", args.archive.display()))?;
    Ok(transport)
}
