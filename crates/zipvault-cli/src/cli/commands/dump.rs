use std::fs::File;
use std::io::BufReader;

use anyhow::Context;
use zipvault_restore::BackupDataReader;

use super::super::args::DumpArgs;
use crate::exit_codes;

pub fn run(args: DumpArgs) -> anyhow::Result<i32> {
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;

    let mut count = 0usize;
    for record in BackupDataReader::new(BufReader::new(file)) {
        let record =
            record.with_context(|| format!("corrupt record data in {}", args.file.display()))?;
        println!(
            "{}\t{}",
            String::from_utf8_lossy(&record.key),
            record.value.len()
        );
        count += 1;
    }

    eprintln!("{count} record(s)");
    Ok(exit_codes::SUCCESS)
}
