//! JSON file I/O with atomic writes
//!
//! Used for the backup sidecar record and the settings file. A write either
//! lands completely or leaves the previous file untouched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{GuardError, GuardResult};

/// Read JSON from a file that must exist
pub fn read_json_required<T, P>(path: P) -> GuardResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GuardError::NotFound {
                entity_type: "File",
                identifier: path.display().to_string(),
            }
        } else {
            GuardError::Io(format!("Failed to open {}: {}", path.display(), e))
        }
    })?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| GuardError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, sync, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> GuardResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            GuardError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| {
        GuardError::Io(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| GuardError::Json(format!("Failed to serialize {}: {}", path.display(), e)))?;
    writer
        .flush()
        .map_err(|e| GuardError::Io(format!("Failed to flush {}: {}", temp_path.display(), e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| GuardError::Io(format!("Failed to sync {}: {}", temp_path.display(), e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        GuardError::Io(format!(
            "Failed to move {} into place: {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}
