//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "zipvault",
    version,
    about = "Restore application data from a zipvault backup archive"
)]
pub struct Cli {
    /// Log debug output (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the restore sets offered by an archive
    Sets(SetsArgs),
    /// Show which requested packages have data and how they restore
    List(ListArgs),
    /// Restore packages into an output directory
    Restore(RestoreArgs),
    /// Print the records of a restored key/value file
    Dump(DumpArgs),
}

/// Archive selection and restore settings shared by archive commands.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Backup archive (.zip)
    #[arg(long, env = "ZIPVAULT_ARCHIVE")]
    pub archive: PathBuf,

    /// YAML file with restore settings (chunk_size, incremental_dir, full_dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Full-stream chunk size in bytes (overrides config and environment)
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SetsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Packages to look up, in restore order
    #[arg(required = true)]
    pub packages: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory receiving <package>.kv and <package>.full files
    #[arg(long)]
    pub out: PathBuf,

    /// Restore set token (default: the archive's current set)
    #[arg(long)]
    pub token: Option<u64>,

    /// Packages to restore, in order
    #[arg(required = true)]
    pub packages: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Key/value file written by `restore`
    pub file: PathBuf,
}
