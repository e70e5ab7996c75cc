//! JSON output for collected records

use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::OutputError;
use crate::models::PoiRecord;

/// Write `records` to `dir/file_name` as an indented JSON array.
///
/// The directory is created if needed. Non-ASCII text is written as-is.
/// The file is replaced atomically, so readers never see a half-written
/// array.
pub fn write_records(dir: &Path, file_name: &str, records: &[PoiRecord]) -> Result<PathBuf, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(records)?;

    let write_err = |source: std::io::Error| OutputError::Write {
        path: path.clone(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    tracing::info!("Wrote {} records to {:?}", records.len(), path);
    Ok(path)
}
