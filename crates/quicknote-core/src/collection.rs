//! Whole-collection persistence: one JSON array of records under one key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::{Error, KeyValueStore};

/// A JSON array of `T` records persisted under a single key.
///
/// Every mutation is a full read-modify-write of the array. Callers hold
/// the guard from [`Collection::lock`] across the whole cycle so that two
/// writers in one process never work from the same stale snapshot.
pub(crate) struct Collection<S> {
    store: S,
    key: &'static str,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Collection<S> {
    pub(crate) fn new(store: S, key: &'static str) -> Self {
        Self {
            store,
            key,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    /// Serialize writers to this collection.
    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Load every record. `Ok(None)` means the key was never written.
    pub(crate) async fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>, Error> {
        let raw = self
            .store
            .get(self.key)
            .await
            .map_err(|e| Error::StorageRead(format!("failed to read {}: {}", self.key, e)))?;

        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let records: Vec<T> = serde_json::from_str(&raw)
            .map_err(|e| Error::StorageRead(format!("failed to parse {}: {}", self.key, e)))?;

        debug!(key = self.key, count = records.len(), "loaded collection");
        Ok(Some(records))
    }

    /// Replace the persisted array with `records`.
    pub(crate) async fn save<T: Serialize>(&self, records: &[T]) -> Result<(), Error> {
        let raw = serde_json::to_string(records)
            .map_err(|e| Error::Internal(format!("failed to serialize {}: {}", self.key, e)))?;

        self.store.set(self.key, &raw).await.map_err(|e| match e {
            Error::StorageWrite(_) => e,
            other => Error::StorageWrite(format!("failed to write {}: {}", self.key, other)),
        })?;

        debug!(key = self.key, count = records.len(), "saved collection");
        Ok(())
    }

    /// Drop the persisted array, so the next load sees a never-written key.
    pub(crate) async fn clear(&self) -> Result<(), Error> {
        self.store.remove(self.key).await.map_err(|e| match e {
            Error::StorageWrite(_) => e,
            other => Error::StorageWrite(format!("failed to remove {}: {}", self.key, other)),
        })?;

        debug!(key = self.key, "cleared collection");
        Ok(())
    }
}
