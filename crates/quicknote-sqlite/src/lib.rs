//! SQLite implementation of the QuickNote key-value store.
//!
//! Every key is one row of the `kv` table, so a whole collection is
//! replaced by a single upsert.

mod migrations;

pub use migrations::{get_pending_migrations, Migration, MIGRATIONS, SCHEMA_VERSION};

use quicknote_core::{Error, KeyValueStore};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database at the given path and run any pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let conn = Connection::open(path).map_err(|e| Error::StorageRead(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database and run migrations.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| Error::StorageRead(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.conn
            .lock()
            .map_err(|_| Error::Internal("sqlite connection lock poisoned".to_string()))
    }

    /// Current schema version recorded in the database (0 if none).
    pub fn schema_version(&self) -> Result<i64, Error> {
        let conn = self.conn()?;
        Self::read_schema_version(&conn)
    }

    fn read_schema_version(conn: &Connection) -> Result<i64, Error> {
        let version: Option<String> = conn
            .query_row(
                "SELECT value FROM _quicknote_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::StorageRead(e.to_string()))?;
        Ok(version.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// Run any pending database migrations.
    fn run_migrations(&self) -> Result<(), Error> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _quicknote_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::StorageWrite(e.to_string()))?;

        let current_version = Self::read_schema_version(&conn)?;
        if current_version >= SCHEMA_VERSION {
            return Ok(());
        }

        for migration in get_pending_migrations(current_version) {
            debug!(version = migration.version, name = migration.name, "running migration");
            for statement in migration.statements {
                conn.execute(statement, []).map_err(|e| {
                    Error::StorageWrite(format!("Migration {} failed: {}", migration.name, e))
                })?;
            }
        }

        conn.execute(
            "INSERT OR REPLACE INTO _quicknote_meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| Error::StorageWrite(e.to_string()))?;

        Ok(())
    }
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let conn = self.conn()?;

        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| Error::StorageRead(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )
        .map_err(|e| Error::StorageWrite(e.to_string()))?;

        debug!(key, bytes = value.len(), "wrote key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let conn = self.conn()?;

        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| Error::StorageWrite(e.to_string()))?;
        Ok(())
    }
}
