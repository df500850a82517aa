//! Provider doubles shared by the unit tests in this crate.

use std::cell::Cell;

use crate::{Error, KeyValueStore, MemoryStore};

/// Memory-backed provider whose writes can be switched to fail.
#[derive(Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Cell<bool>,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        if self.fail_writes.get() {
            return Err(Error::StorageWrite("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.remove(key).await
    }
}

/// Memory-backed provider that yields to the scheduler on every call, so
/// concurrently driven futures interleave between read and write.
#[derive(Default)]
pub(crate) struct YieldingStore {
    inner: MemoryStore,
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for YieldingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        tokio::task::yield_now().await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.inner.remove(key).await
    }
}
