use tracing::error;

use crate::{Clock, CreateNote, Error, KeyValueStore, Note, NoteStore, SystemClock, UpdateNote};

/// Title given to notes saved with a blank title.
pub const UNTITLED: &str = "Untitled";

/// Cached, ordered view of the [`NoteStore`] for presentation code.
pub struct NotesViewModel<S, C = SystemClock> {
    store: NoteStore<S, C>,
    notes: Vec<Note>,
    loading: bool,
    error: Option<String>,
}

impl<S: KeyValueStore, C: Clock> NotesViewModel<S, C> {
    /// Wrap `store` and load its contents.
    pub async fn open(store: NoteStore<S, C>) -> Self {
        let mut model = Self {
            store,
            notes: Vec::new(),
            loading: true,
            error: None,
        };
        model.reload().await;
        model
    }

    /// Notes, most recently updated first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message describing the last failed command, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn store(&self) -> &NoteStore<S, C> {
        &self.store
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Replace the cache with the store's contents.
    pub async fn reload(&mut self) {
        self.loading = true;
        self.error = None;
        self.notes = self.store.list_all().await;
        self.loading = false;
    }

    fn fail(&mut self, message: &str, err: Error) -> Error {
        error!(error = %err, "{}", message);
        self.error = Some(message.to_string());
        err
    }

    /// Save a new note. Blank titles become [`UNTITLED`]; a note with
    /// neither title nor content is rejected.
    pub async fn create(
        &mut self,
        title: &str,
        content: &str,
        category_id: Option<String>,
    ) -> Result<Note, Error> {
        let (title, content) = normalize_draft(title, content)?;
        self.error = None;

        match self
            .store
            .create(CreateNote {
                title,
                content,
                category_id,
            })
            .await
        {
            Ok(note) => {
                self.notes.insert(0, note.clone());
                Ok(note)
            }
            Err(e) => Err(self.fail("Failed to create note", e)),
        }
    }

    /// Update a note and move it to the front of the cache.
    ///
    /// Returns `Ok(None)` if the note does not exist.
    pub async fn update(&mut self, id: &str, update: UpdateNote) -> Result<Option<Note>, Error> {
        let update = normalize_update(update)?;
        self.error = None;

        match self.store.update(id, update).await {
            Ok(Some(note)) => {
                self.notes.retain(|n| n.id != id);
                self.notes.insert(0, note.clone());
                Ok(Some(note))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.fail("Failed to update note", e)),
        }
    }

    /// Delete a note.
    pub async fn delete(&mut self, id: &str) -> Result<(), Error> {
        self.error = None;

        if self.store.delete(id).await {
            self.notes.retain(|n| n.id != id);
            Ok(())
        } else {
            let err = Error::StorageWrite(format!("failed to delete note {}", id));
            Err(self.fail("Failed to delete note", err))
        }
    }

    /// Delete several notes, one store write at a time.
    ///
    /// Every id is attempted even if an earlier one fails. Returns the number
    /// of successful deletes, or an error if any delete failed.
    pub async fn delete_many<I, T>(&mut self, ids: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.error = None;

        let mut deleted = 0usize;
        let mut failed = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if self.store.delete(id).await {
                self.notes.retain(|n| n.id != id);
                deleted += 1;
            } else {
                failed.push(id.to_string());
            }
        }

        if failed.is_empty() {
            Ok(deleted)
        } else {
            let err = Error::StorageWrite(format!("failed to delete notes {}", failed.join(",")));
            Err(self.fail("Failed to delete some notes", err))
        }
    }

    /// Detach `category_id` from every note, then reload from the store.
    pub async fn clear_category_from_notes(&mut self, category_id: &str) -> Result<(), Error> {
        self.error = None;

        if self.store.clear_category_from_notes(category_id).await {
            self.reload().await;
            Ok(())
        } else {
            let err = Error::StorageWrite(format!(
                "failed to clear category {} from notes",
                category_id
            ));
            Err(self.fail("Failed to clear category from notes", err))
        }
    }
}

/// Trim a note draft and apply the default title.
fn normalize_draft(title: &str, content: &str) -> Result<(String, String), Error> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() && content.is_empty() {
        return Err(Error::Validation("note is empty".into()));
    }

    let title = if title.is_empty() { UNTITLED } else { title };
    Ok((title.to_string(), content.to_string()))
}

fn normalize_update(update: UpdateNote) -> Result<UpdateNote, Error> {
    if let (Some(title), Some(content)) = (&update.title, &update.content) {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Err(Error::Validation("note is empty".into()));
        }
    }

    Ok(UpdateNote {
        title: update.title.map(|t| {
            let t = t.trim();
            if t.is_empty() {
                UNTITLED.to_string()
            } else {
                t.to_string()
            }
        }),
        content: update.content.map(|c| c.trim().to_string()),
        category_id: update.category_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlakyStore, YieldingStore};
    use crate::{FixedClock, MemoryStore};
    use chrono::{Duration, TimeZone, Utc};

    async fn open_memory() -> NotesViewModel<MemoryStore> {
        NotesViewModel::open(NoteStore::new(MemoryStore::new())).await
    }

    #[tokio::test]
    async fn test_open_loads_existing_notes() {
        let kv = MemoryStore::new();
        let store = NoteStore::new(&kv);
        store
            .create(CreateNote {
                title: "kept".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let model = NotesViewModel::open(NoteStore::new(&kv)).await;
        assert!(!model.loading());
        assert_eq!(model.notes().len(), 1);
        assert_eq!(model.notes()[0].title, "kept");
    }

    #[tokio::test]
    async fn test_create_normalizes_draft() {
        let mut model = open_memory().await;

        let note = model.create("   ", "  body  ", None).await.unwrap();
        assert_eq!(note.title, UNTITLED);
        assert_eq!(note.content, "body");
        assert_eq!(model.notes()[0], note);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_note() {
        let mut model = open_memory().await;

        let err = model.create(" ", "\n", None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(model.notes().is_empty());
        assert!(model.store().list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_matches_store_order() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let store = NoteStore::with_clock(MemoryStore::new(), &clock);
        let mut model = NotesViewModel::open(store).await;

        let a = model.create("a", "", None).await.unwrap();
        clock.advance(Duration::seconds(1));
        let b = model.create("b", "", None).await.unwrap();
        clock.advance(Duration::seconds(1));
        model.create("c", "", None).await.unwrap();
        clock.advance(Duration::seconds(1));

        model
            .update(
                &a.id,
                UpdateNote {
                    title: Some("a2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        model.delete(&b.id).await.unwrap();

        let cached: Vec<_> = model.notes().iter().map(|n| n.id.clone()).collect();
        let stored: Vec<_> = model
            .store()
            .list_all()
            .await
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(cached, stored);
        assert_eq!(model.notes()[0].title, "a2");
    }

    #[tokio::test]
    async fn test_update_missing_note_is_noop() {
        let mut model = open_memory().await;
        model.create("a", "", None).await.unwrap();

        let result = model
            .update(
                "missing",
                UpdateNote {
                    content: Some("x".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(model.error().is_none());
    }

    #[tokio::test]
    async fn test_update_blank_title_becomes_untitled() {
        let mut model = open_memory().await;
        let note = model.create("Title", "body", None).await.unwrap();

        let updated = model
            .update(
                &note.id,
                UpdateNote {
                    title: Some(" ".to_string()),
                    content: Some("body".to_string()),
                    category_id: Some(Some("ideas".to_string())),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, UNTITLED);
        assert_eq!(updated.category_id.as_deref(), Some("ideas"));
    }

    #[tokio::test]
    async fn test_write_failure_is_recorded_and_returned() {
        let mut model = NotesViewModel::open(NoteStore::new(FlakyStore::new())).await;
        let note = model.create("a", "", None).await.unwrap();

        model.store().store().fail_writes(true);

        let err = model.create("b", "", None).await.unwrap_err();
        assert!(matches!(err, Error::StorageWrite(_)));
        assert_eq!(model.error(), Some("Failed to create note"));

        assert!(model.delete(&note.id).await.is_err());
        assert_eq!(model.error(), Some("Failed to delete note"));
        assert_eq!(model.notes().len(), 1);

        model.store().store().fail_writes(false);
        model.delete(&note.id).await.unwrap();
        assert!(model.error().is_none());
        assert!(model.notes().is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_keeps_cache() {
        let mut model = NotesViewModel::open(NoteStore::new(FlakyStore::new())).await;
        let note = model.create("a", "body", None).await.unwrap();
        model.store().store().fail_writes(true);

        let err = model
            .update(
                &note.id,
                UpdateNote {
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageWrite(_)));
        assert_eq!(model.error(), Some("Failed to update note"));
        assert_eq!(model.notes().to_vec(), vec![note]);
    }

    #[tokio::test]
    async fn test_clear_category_failure_is_recorded() {
        let mut model = NotesViewModel::open(NoteStore::new(FlakyStore::new())).await;
        let note = model.create("w", "", Some("work".to_string())).await.unwrap();
        model.store().store().fail_writes(true);

        let err = model.clear_category_from_notes("work").await.unwrap_err();
        assert!(matches!(err, Error::StorageWrite(_)));
        assert_eq!(model.error(), Some("Failed to clear category from notes"));
        assert_eq!(model.get_by_id(&note.id), Some(&note));

        model.store().store().fail_writes(false);
        model.clear_category_from_notes("work").await.unwrap();
        assert!(model.error().is_none());
    }

    #[tokio::test]
    async fn test_delete_many_removes_every_id() {
        let mut model = NotesViewModel::open(NoteStore::new(YieldingStore::default())).await;
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(model.create(&format!("n{}", i), "", None).await.unwrap().id);
        }

        let deleted = model.delete_many([&ids[0], &ids[5]]).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(model.notes().len(), 8);
        assert_eq!(model.store().list_all().await.len(), 8);
    }

    #[tokio::test]
    async fn test_delete_many_reports_failures() {
        let mut model = NotesViewModel::open(NoteStore::new(FlakyStore::new())).await;
        let a = model.create("a", "", None).await.unwrap();
        model.store().store().fail_writes(true);

        let err = model.delete_many(vec![a.id.clone()]).await.unwrap_err();
        assert!(matches!(err, Error::StorageWrite(_)));
        assert_eq!(model.error(), Some("Failed to delete some notes"));
        assert_eq!(model.notes().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_category_refreshes_cache() {
        let mut model = open_memory().await;
        let work = model.create("w", "", Some("work".to_string())).await.unwrap();
        model.create("i", "", Some("ideas".to_string())).await.unwrap();

        model.clear_category_from_notes("work").await.unwrap();

        let cleared = model.get_by_id(&work.id).unwrap();
        assert!(cleared.category_id.is_none());
        assert!(cleared.updated_at > work.updated_at);
        assert_eq!(model.notes()[0].id, work.id);
    }
}
