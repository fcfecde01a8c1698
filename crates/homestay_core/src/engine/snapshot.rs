//! Snapshot document I/O.
//!
//! # Responsibility
//! - Read the whole snapshot document from disk, treating an absent
//!   file as "no snapshot yet".
//! - Replace the snapshot file atomically on write.
//!
//! # Invariants
//! - The document root is always a single JSON object.
//! - Readers never observe a half-written file: writes go to a temp
//!   file in the same directory and are renamed into place.

use super::{SnapshotError, SnapshotResult};
use log::{error, info};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Reads the snapshot document at `path`.
///
/// Returns `Ok(None)` when the file does not exist; every other read
/// or decode failure is surfaced to the caller.
pub fn read_document(path: &Path) -> SnapshotResult<Option<Map<String, Value>>> {
    let started_at = Instant::now();

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                "event=snapshot_read module=engine status=missing path={}",
                path.display()
            );
            return Ok(None);
        }
        Err(err) => {
            error!(
                "event=snapshot_read module=engine status=error path={} error_code=snapshot_unreadable error={}",
                path.display(),
                err
            );
            return Err(err.into());
        }
    };

    let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
        error!(
            "event=snapshot_read module=engine status=error path={} error_code=snapshot_undecodable error={}",
            path.display(),
            err
        );
        SnapshotError::from(err)
    })?;

    let Value::Object(document) = value else {
        return Err(SnapshotError::Malformed(
            "snapshot root must be a JSON object".to_string(),
        ));
    };

    info!(
        "event=snapshot_read module=engine status=ok path={} entries={} duration_ms={}",
        path.display(),
        document.len(),
        started_at.elapsed().as_millis()
    );
    Ok(Some(document))
}

/// Writes `document` to `path`, fully replacing prior content.
///
/// The document is serialized into a temp file next to `path` and
/// renamed over it, so a crash mid-write leaves the previous snapshot
/// intact.
pub fn write_document(path: &Path, document: &Map<String, Value>) -> SnapshotResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(directory)?;
    serde_json::to_writer(&mut staged, document)?;
    staged.persist(path).map_err(|err| {
        error!(
            "event=snapshot_write module=engine status=error path={} error_code=snapshot_rename_failed error={}",
            path.display(),
            err.error
        );
        SnapshotError::Io(err.error)
    })?;

    Ok(())
}
