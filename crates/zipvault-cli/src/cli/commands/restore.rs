use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::warn;
use zipvault_restore::{
    BackupDataWriter, ChunkResult, NextPackage, RestoreMode, RestoreTransport, TransportStatus,
};

use super::super::args::RestoreArgs;
use super::open_transport;
use crate::exit_codes;

/// Result of restoring one package.
#[derive(Debug)]
enum Outcome {
    Records(usize),
    Streamed(u64),
    Failed(String),
}

pub fn run(args: RestoreArgs) -> anyhow::Result<i32> {
    let mut transport = open_transport(&args.source)?;
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output dir: {}", args.out.display()))?;

    let token = args
        .token
        .unwrap_or_else(|| transport.current_restore_set());
    transport.start(token, args.packages);

    let mut failed = 0usize;
    while let NextPackage::Package(desc) = transport.next_package() {
        let outcome = match (check_package_name(&desc.package), desc.mode) {
            (_, RestoreMode::None) => continue,
            (Err(reason), _) => Outcome::Failed(reason),
            (Ok(()), RestoreMode::KeyValue) => {
                restore_key_value(&mut transport, &args.out, &desc.package)
            }
            (Ok(()), RestoreMode::FullStream) => {
                restore_full(&mut transport, &args.out, &desc.package)
            }
        };
        match &outcome {
            Outcome::Records(n) => println!("{}\t{}\t{n} record(s)", desc.package, desc.mode),
            Outcome::Streamed(n) => println!("{}\t{}\t{n} byte(s)", desc.package, desc.mode),
            Outcome::Failed(reason) => {
                failed += 1;
                println!("{}\t{}\tfailed: {reason}", desc.package, desc.mode);
            }
        }
    }
    transport.finish();

    if failed > 0 {
        eprintln!("restore finished with {failed} failed package(s)");
        return Ok(exit_codes::PACKAGE_FAILED);
    }
    Ok(exit_codes::SUCCESS)
}

/// Package names become file names under `--out` and must not leave it.
fn check_package_name(package: &str) -> Result<(), String> {
    if package.is_empty()
        || package == "."
        || package.contains("..")
        || package.contains(['/', '\\'])
    {
        return Err(format!("invalid package name for an output file: {package:?}"));
    }
    Ok(())
}

fn output_path(out: &Path, package: &str, ext: &str) -> PathBuf {
    out.join(format!("{package}.{ext}"))
}

fn restore_key_value(transport: &mut RestoreTransport, out: &Path, package: &str) -> Outcome {
    let path = output_path(out, package, "kv");
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => return Outcome::Failed(format!("cannot create {}: {e}", path.display())),
    };

    let mut writer = BackupDataWriter::new(BufWriter::new(file));
    let status = transport.transfer_key_value(&mut writer);
    let records = writer.records();
    let flushed = writer.into_inner().flush();

    match (status, flushed) {
        (TransportStatus::Ok, Ok(())) => Outcome::Records(records),
        (TransportStatus::Ok, Err(e)) => discard(&path, format!("write failed: {e}")),
        (status, _) => discard(&path, format!("transport status {}", status.code())),
    }
}

fn restore_full(transport: &mut RestoreTransport, out: &Path, package: &str) -> Outcome {
    let path = output_path(out, package, "full");
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            transport.abort();
            return Outcome::Failed(format!("cannot create {}: {e}", path.display()));
        }
    };

    let mut output = BufWriter::new(file);
    let mut total = 0u64;
    loop {
        match transport.stream_chunk(&mut output) {
            Ok(ChunkResult::Data(n)) => total += n as u64,
            Ok(ChunkResult::NoMoreData) => {
                return match output.flush() {
                    Ok(()) => Outcome::Streamed(total),
                    Err(e) => discard(&path, format!("write failed: {e}")),
                }
            }
            Err(TransportStatus::PackageRejected) => {
                return discard(&path, "rejected by archive".to_string())
            }
            Err(status) => {
                transport.abort();
                return discard(&path, format!("transport status {}", status.code()));
            }
        }
    }
}

/// Remove a partial output file and report the failure.
fn discard(path: &Path, reason: String) -> Outcome {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove partial output");
    }
    Outcome::Failed(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_names_stay_inside_output_dir() {
        assert!(check_package_name("com.example.notes").is_ok());
        assert!(check_package_name("../x").is_err());
        assert!(check_package_name("a/b").is_err());
        assert!(check_package_name("a\\b").is_err());
        assert!(check_package_name("..").is_err());
        assert!(check_package_name("").is_err());
    }
}
