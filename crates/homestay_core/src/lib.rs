//! Core persistence layer for homestay domain records.
//! This crate is the single source of truth for record identity,
//! snapshot layout and variant dispatch.

pub mod engine;
pub mod logging;
pub mod model;
pub mod service;

pub use engine::{
    FileStorage, RecordKey, RecordStore, SnapshotError, StorageError, StorageResult,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{ModelError, Record, RecordKind, KIND_KEY, TIMESTAMP_FORMAT};
pub use service::record_service::RecordService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
