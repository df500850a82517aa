//! Embedded database migrations for the SQLite store.
//!
//! Migrations are versioned and run automatically when the database is opened.
//! The schema version is tracked in the `_quicknote_meta` table.

/// Current schema version. Increment when adding new migrations.
pub const SCHEMA_VERSION: i64 = 1;

/// A database migration with version number and SQL statements.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations in order. Each migration should be idempotent where possible.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    statements: &[
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
    ],
}];

/// Get migrations that need to be applied given the current version.
pub fn get_pending_migrations(current_version: i64) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect()
}
