//! File-based key-value storage for QuickNote.
//!
//! Stores every key as one JSON file:
//!
//! ```text
//! .quicknote/
//!   .lock                      # Lock file for atomic writes
//!   quicknote_notes.json
//!   quicknote_categories.json
//! ```

use fs2::FileExt;
use quicknote_core::{Error, KeyValueStore};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-based key-value store.
pub struct FilesStore {
    root: PathBuf,
}

impl FilesStore {
    /// Open a file-based store rooted at the given directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .map_err(|e| Error::StorageWrite(format!("Failed to create data dir: {}", e)))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire an exclusive lock on the store.
    fn lock(&self) -> Result<FileLock, Error> {
        let lock_path = self.root.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| Error::StorageWrite(format!("Failed to open lock file: {}", e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::StorageWrite(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }

    /// Get the path of the file holding `key`.
    fn key_path(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Validation(format!("invalid storage key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }

    /// Write a value to disk atomically.
    fn write_file(&self, path: &Path, contents: &str) -> Result<(), Error> {
        let temp_path = path.with_extension("json.tmp");

        // Write to temp file
        let mut file = File::create(&temp_path)
            .map_err(|e| Error::StorageWrite(format!("Failed to create temp file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| Error::StorageWrite(format!("Failed to write temp file: {}", e)))?;

        file.sync_all()
            .map_err(|e| Error::StorageWrite(format!("Failed to sync temp file: {}", e)))?;

        // Atomic rename
        fs::rename(&temp_path, path)
            .map_err(|e| Error::StorageWrite(format!("Failed to rename temp file: {}", e)))?;

        Ok(())
    }
}

/// RAII guard for file locking.
struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[async_trait::async_trait(?Send)]
impl KeyValueStore for FilesStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.key_path(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageRead(format!("Failed to read {}: {}", key, e))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.key_path(key)?;
        let _lock = self.lock()?;

        self.write_file(&path, value)?;
        debug!(key, bytes = value.len(), "wrote key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        let path = self.key_path(key)?;
        let _lock = self.lock()?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StorageWrite(format!("Failed to remove {}: {}", key, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quicknote_core::{
        default_categories, CategoryStore, CreateNote, NoteStore, UpdateNote, CATEGORIES_KEY,
        NOTES_KEY,
    };
    use std::thread;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FilesStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesStore::open(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_temp, store) = setup();
        assert!(store.get("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let (temp, store) = setup();

        store.set("greeting", "[1,2]").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("[1,2]"));
        assert!(temp.path().join("greeting.json").exists());
        assert!(!temp.path().join("greeting.json.tmp").exists());

        store.remove("greeting").await.unwrap();
        store.remove("greeting").await.unwrap();
        assert!(store.get("greeting").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let (_temp, store) = setup();
        let err = store.set("../escape", "x").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_notes_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let created = {
            let notes = NoteStore::new(FilesStore::open(temp_dir.path()).unwrap());
            let created = notes
                .create(CreateNote {
                    title: "Persisted".to_string(),
                    content: "Across opens".to_string(),
                    category_id: Some("ideas".to_string()),
                })
                .await
                .unwrap();
            notes
                .update(
                    &created.id,
                    UpdateNote {
                        title: Some("Persisted twice".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap()
                .unwrap()
        };

        let notes = NoteStore::new(FilesStore::open(temp_dir.path()).unwrap());
        assert_eq!(notes.get_by_id(&created.id).await, Some(created));
        assert!(temp_dir.path().join(format!("{}.json", NOTES_KEY)).exists());
    }

    #[tokio::test]
    async fn test_categories_seed_to_disk() {
        let (temp, store) = setup();
        let categories = CategoryStore::new(store);

        assert_eq!(categories.list_all().await, default_categories());

        let raw = fs::read_to_string(temp.path().join(format!("{}.json", CATEGORIES_KEY))).unwrap();
        assert!(raw.contains("\"important\""));
    }

    #[tokio::test]
    async fn test_concurrent_writers_never_leave_partial_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        FilesStore::open(&root).unwrap();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let root = root.clone();
                thread::spawn(move || {
                    let rt = tokio::runtime::Runtime::new().unwrap();
                    rt.block_on(async {
                        let store = FilesStore::open(&root).unwrap();
                        let value = format!("[\"{}\"]", "x".repeat(1000 * (i + 1)));
                        store.set("shared", &value).await.unwrap();
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let store = FilesStore::open(&root).unwrap();
        let raw = store.get("shared").await.unwrap().unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].len() % 1000, 0);
    }
}
