//! Materialized exports.

use std::io::{Seek, SeekFrom};

use tempfile::SpooledTempFile;

use crate::error::CubeResult;

/// Write rows as comma separated CSV into a spooled buffer.
///
/// The buffer lives in memory up to `threshold` bytes and moves to a
/// temporary file past it. It is returned rewound to the start.
pub fn spool_rows<I>(rows: I, threshold: usize) -> CubeResult<SpooledTempFile>
where
    I: IntoIterator<Item = CubeResult<Vec<String>>>,
{
    let mut writer = csv::Writer::from_writer(SpooledTempFile::new(threshold));
    let mut count = 0usize;
    for row in rows {
        writer.write_record(&row?)?;
        count += 1;
    }
    writer.flush()?;

    let mut file = writer.into_inner().map_err(|e| e.into_error())?;
    log::debug!(
        "spooled {} rows ({})",
        count,
        if file.is_rolled() { "on disk" } else { "in memory" }
    );
    file.seek(SeekFrom::Start(0))?;
    Ok(file)
}
