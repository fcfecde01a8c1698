//! Record registry contracts and the JSON file implementation.
//!
//! # Responsibility
//! - Provide the stable registry API (`all`/`register`/`save`/`reload`)
//!   over the composite-key identity map.
//! - Keep snapshot layout and variant dispatch inside the persistence
//!   boundary.
//!
//! # Invariants
//! - Registry keys are always `<TypeName>.<identity>`.
//! - Duplicate registration for the same key is last-writer-wins.
//! - Reload rejects unknown variant names instead of interpreting them,
//!   and registers nothing from a snapshot that fails to decode.

use crate::engine::{snapshot, SnapshotError};
use crate::model::record::{ModelError, Record, RecordKind, KIND_KEY};
use log::{debug, error, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Composite registry key, `<TypeName>.<identity>`.
pub type RecordKey = String;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage engine error for registry and snapshot operations.
#[derive(Debug)]
pub enum StorageError {
    Snapshot(SnapshotError),
    Model(ModelError),
    UnknownKind { key: String, kind: String },
    InvalidData(String),
    NotFound(RecordKey),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::Model(err) => write!(f, "{err}"),
            Self::UnknownKind { key, kind } => {
                write!(f, "unknown record kind `{kind}` in snapshot entry `{key}`")
            }
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::UnknownKind { .. } => None,
            Self::InvalidData(_) => None,
            Self::NotFound(_) => None,
        }
    }
}

impl From<SnapshotError> for StorageError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<ModelError> for StorageError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

/// Registry interface for record persistence.
///
/// One implementation exists today (`FileStorage`); the trait keeps
/// service and test code decoupled from the snapshot file layout.
pub trait RecordStore {
    /// Returns the live registry, keyed by `<TypeName>.<identity>`.
    ///
    /// Callers get a borrowed view: they observe later mutations but
    /// cannot change registry membership themselves.
    fn all(&self) -> &HashMap<RecordKey, Record>;

    fn get(&self, key: &str) -> Option<&Record>;

    fn get_mut(&mut self, key: &str) -> Option<&mut Record>;

    /// Inserts `record` under its composite key.
    ///
    /// A duplicate key silently replaces the prior entry
    /// (last-writer-wins), mirroring registry overwrite on reload.
    fn register(&mut self, record: Record) -> RecordKey;

    /// Serializes every registered record into one snapshot document
    /// and replaces the snapshot file.
    fn save(&self) -> StorageResult<()>;

    /// Rebuilds the registry from the snapshot file, if it exists.
    ///
    /// A missing file is a successful no-op (fresh start). A snapshot
    /// entry that fails variant dispatch or reconstruction fails the
    /// whole reload before anything from that load is registered.
    fn reload(&mut self) -> StorageResult<()>;
}

/// JSON-file-backed record registry.
///
/// Designed for single-process, single-writer use; `&`/`&mut`
/// receivers serialize all access, and every `save` rewrites the full
/// snapshot.
#[derive(Debug)]
pub struct FileStorage {
    snapshot_path: PathBuf,
    records: HashMap<RecordKey, Record>,
}

impl FileStorage {
    /// Opens the engine at `path` and immediately reloads the last
    /// snapshot.
    ///
    /// This is the one construction path; exactly one engine value per
    /// process is expected, threaded explicitly to its callers.
    ///
    /// # Side effects
    /// - Reads the snapshot file when present.
    /// - Emits `storage_open` logging events with duration and status.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let started_at = Instant::now();
        let mut storage = Self {
            snapshot_path: path.into(),
            records: HashMap::new(),
        };

        match storage.reload() {
            Ok(()) => {
                info!(
                    "event=storage_open module=engine status=ok path={} records={} duration_ms={}",
                    storage.snapshot_path.display(),
                    storage.records.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(storage)
            }
            Err(err) => {
                error!(
                    "event=storage_open module=engine status=error path={} duration_ms={} error={}",
                    storage.snapshot_path.display(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    fn parse_entry(key: &str, value: Value) -> StorageResult<Record> {
        let Value::Object(mut data) = value else {
            return Err(StorageError::InvalidData(format!(
                "snapshot entry `{key}` must be a JSON object"
            )));
        };

        let kind_tag = match data.remove(KIND_KEY) {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(StorageError::InvalidData(format!(
                    "snapshot entry `{key}` has a non-string `{KIND_KEY}` tag: {other}"
                )));
            }
            None => {
                return Err(StorageError::InvalidData(format!(
                    "snapshot entry `{key}` is missing the `{KIND_KEY}` tag"
                )));
            }
        };

        let kind = RecordKind::parse(&kind_tag).ok_or_else(|| StorageError::UnknownKind {
            key: key.to_string(),
            kind: kind_tag,
        })?;

        Record::from_snapshot(kind, data).map_err(StorageError::from)
    }
}

impl RecordStore for FileStorage {
    fn all(&self) -> &HashMap<RecordKey, Record> {
        &self.records
    }

    fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    fn register(&mut self, record: Record) -> RecordKey {
        let key = record.key();
        if self.records.insert(key.clone(), record).is_some() {
            debug!("event=record_register module=engine status=overwrite key={key}");
        }
        key
    }

    fn save(&self) -> StorageResult<()> {
        let started_at = Instant::now();

        let mut document = Map::new();
        for (key, record) in &self.records {
            document.insert(key.clone(), Value::Object(record.to_snapshot_map()));
        }
        snapshot::write_document(&self.snapshot_path, &document)?;

        info!(
            "event=snapshot_save module=engine status=ok path={} records={} duration_ms={}",
            self.snapshot_path.display(),
            document.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn reload(&mut self) -> StorageResult<()> {
        let started_at = Instant::now();

        let Some(document) = snapshot::read_document(&self.snapshot_path)? else {
            return Ok(());
        };

        // Decode every entry before touching the registry, so one bad
        // entry cannot leave a half-loaded state behind.
        let mut restored = Vec::with_capacity(document.len());
        for (key, value) in document {
            match Self::parse_entry(&key, value) {
                Ok(record) => restored.push(record),
                Err(err) => {
                    error!(
                        "event=snapshot_reload module=engine status=error key={key} error={err}"
                    );
                    return Err(err);
                }
            }
        }

        for record in restored {
            self.register(record);
        }

        info!(
            "event=snapshot_reload module=engine status=ok path={} records={} duration_ms={}",
            self.snapshot_path.display(),
            self.records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
