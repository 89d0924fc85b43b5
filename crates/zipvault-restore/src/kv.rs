//! Synchronous key/value record transfer.

use tracing::debug;

use crate::archive::{decode_key, locate, ArchiveLayout, ArchiveSource, EntryMatch};
use crate::error::RestoreResult;
use crate::record::RecordSink;

/// Copy every record of `package` into `sink`, in archive order.
///
/// One archive handle is used for the whole transfer; each lookup resumes
/// after the previous record. Records already written stay written if a
/// later one fails. Returns the number of records written.
pub fn transfer_records<S>(
    source: &dyn ArchiveSource,
    layout: &ArchiveLayout,
    package: &str,
    sink: &mut S,
) -> RestoreResult<usize>
where
    S: RecordSink + ?Sized,
{
    let prefix = layout.incremental_prefix(package);
    let matcher = EntryMatch::Prefix(&prefix);

    let Some((mut archive, mut entry)) = locate(source, matcher)? else {
        return Ok(0);
    };

    let mut written = 0;
    loop {
        let key = decode_key(ArchiveLayout::record_name(&entry.name))?;
        let value = archive.read_entry(&entry)?;
        debug!(package, entry = %entry.name, bytes = value.len(), "restoring record");

        sink.write_entity_header(&key, value.len())?;
        sink.write_entity_data(&value)?;
        written += 1;

        match archive.find_from(entry.index + 1, matcher)? {
            Some(next) => entry = next,
            None => break,
        }
    }
    Ok(written)
}
