//! Backend selection for the CLI.

use anyhow::{Context, Result};
use clap::ValueEnum;
use quicknote_core::{Error, KeyValueStore};
use quicknote_files::FilesStore;
use quicknote_sqlite::SqliteStore;
use std::path::Path;

pub const SQLITE_FILE: &str = "quicknote.sqlite";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// One JSON file per collection
    Files,
    /// A single SQLite database file
    Sqlite,
}

/// The key-value store chosen on the command line.
pub enum Storage {
    Files(FilesStore),
    Sqlite(SqliteStore),
}

impl Storage {
    /// Open the chosen backend inside `data_dir`, creating it if needed.
    pub fn open(backend: Backend, data_dir: &Path) -> Result<Self> {
        let storage = match backend {
            Backend::Files => {
                Storage::Files(FilesStore::open(data_dir).context("Failed to open file store")?)
            }
            Backend::Sqlite => {
                std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;
                Storage::Sqlite(
                    SqliteStore::open(data_dir.join(SQLITE_FILE))
                        .context("Failed to open SQLite store")?,
                )
            }
        };
        Ok(storage)
    }
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self {
            Storage::Files(store) => store.get(key).await,
            Storage::Sqlite(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        match self {
            Storage::Files(store) => store.set(key, value).await,
            Storage::Sqlite(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        match self {
            Storage::Files(store) => store.remove(key).await,
            Storage::Sqlite(store) => store.remove(key).await,
        }
    }
}
