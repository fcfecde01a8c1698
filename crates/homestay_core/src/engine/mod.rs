//! Storage engine: identity map plus whole-file JSON persistence.
//!
//! # Responsibility
//! - Keep the in-memory registry of live records.
//! - Serialize the full registry to a single snapshot document and
//!   rebuild it from that document at process start.
//!
//! # Invariants
//! - The snapshot file is the only external resource the engine touches.
//! - A missing snapshot file is the empty initial state, never an error.
//! - Snapshot writes replace the file atomically (temp file + rename).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod file_storage;
mod snapshot;

pub use file_storage::{FileStorage, RecordKey, RecordStore, StorageError, StorageResult};

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Transport-level failures while reading or writing the snapshot file.
#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Malformed(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Malformed(message) => write!(f, "malformed snapshot document: {message}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Malformed(_) => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
