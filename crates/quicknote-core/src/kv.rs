use std::cell::RefCell;
use std::collections::HashMap;

use crate::Error;

/// String-keyed persistence provider that the stores are built on.
///
/// Uses `async_trait` with `?Send`: the stores run on a single-threaded
/// event loop and providers are free to hold non-`Send` state.
#[async_trait::async_trait(?Send)]
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Durably replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), Error>;
}

#[async_trait::async_trait(?Send)]
impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        (**self).remove(key).await
    }
}

/// In-process provider. Contents live as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
