//! Record use-case service.
//!
//! # Responsibility
//! - Provide stable create/mutate/commit entry points for core callers.
//! - Delegate registry membership and persistence to the store.
//!
//! # Invariants
//! - Service APIs never bypass the store to touch the snapshot file.
//! - Every durable state change goes through a full snapshot save.

use crate::engine::{RecordKey, RecordStore, StorageError, StorageResult};
use crate::model::record::{Record, RecordKind};
use serde_json::Value;
use std::collections::HashMap;

/// Use-case service wrapper for record lifecycle operations.
pub struct RecordService<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> RecordService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a fresh record of `kind` and registers it.
    ///
    /// # Contract
    /// - The record gets a generated identity, both timestamps = now
    ///   and the variant's per-instance defaults.
    /// - Registration is immediate; durability requires a later
    ///   `commit_update` or `save`.
    pub fn create(&mut self, kind: RecordKind) -> RecordKey {
        self.store.register(Record::new(kind))
    }

    /// Sets one open attribute on an existing record.
    ///
    /// # Errors
    /// - `StorageError::NotFound` when `key` is not registered.
    /// - `StorageError::Model` when the attribute name is reserved.
    pub fn set_attribute(
        &mut self,
        key: &str,
        name: impl Into<String>,
        value: Value,
    ) -> StorageResult<()> {
        let record = self
            .store
            .get_mut(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        record.set_attribute(name, value).map_err(StorageError::from)
    }

    /// Commits an update: moves `updated_at` to now, then persists the
    /// full snapshot.
    ///
    /// # Contract
    /// - `updated_at` strictly increases relative to its prior value.
    /// - The snapshot file reflects the whole registry afterwards; no
    ///   batching happens across calls.
    pub fn commit_update(&mut self, key: &str) -> StorageResult<()> {
        let record = self
            .store
            .get_mut(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        record.touch();
        self.store.save()
    }

    /// Gets one record by composite key.
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.store.get(key)
    }

    /// Returns the live registry view.
    pub fn all(&self) -> &HashMap<RecordKey, Record> {
        self.store.all()
    }

    /// Persists the full registry snapshot.
    pub fn save(&self) -> StorageResult<()> {
        self.store.save()
    }

    /// Rebuilds the registry from the last snapshot.
    pub fn reload(&mut self) -> StorageResult<()> {
        self.store.reload()
    }
}
