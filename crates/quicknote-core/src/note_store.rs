use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, error, warn};

use crate::collection::Collection;
use crate::{generate_id, Clock, CreateNote, Error, KeyValueStore, Note, SystemClock, UpdateNote};

/// Storage key holding the JSON array of notes.
pub const NOTES_KEY: &str = "quicknote_notes";

/// Durable CRUD over the full note collection.
///
/// Listing order is always descending by `updated_at`: creates go to the
/// front and updates move the note to the front.
pub struct NoteStore<S, C = SystemClock> {
    notes: Collection<S>,
    clock: C,
}

impl<S: KeyValueStore> NoteStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> NoteStore<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            notes: Collection::new(store, NOTES_KEY),
            clock,
        }
    }

    /// The underlying provider.
    pub fn store(&self) -> &S {
        self.notes.store()
    }

    /// Load the collection sorted newest first. An absent key is an empty collection.
    async fn load_sorted(&self) -> Result<Vec<Note>, Error> {
        let mut notes: Vec<Note> = self.notes.load().await?.unwrap_or_default();
        // Stable: ties keep their persisted order.
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Load the collection for a mutation. Unreadable data is logged and
    /// treated as an empty collection, like [`NoteStore::list_all`].
    async fn load_for_write(&self) -> Vec<Note> {
        match self.load_sorted().await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(error = %e, "failed to load notes, starting from an empty list");
                Vec::new()
            }
        }
    }

    /// Timestamp for a mutation, in milliseconds, strictly after every
    /// `updated_at` already in `notes`.
    fn stamp(&self, notes: &[Note]) -> DateTime<Utc> {
        let now = self.clock.now().trunc_subsecs(3);
        match notes.iter().map(|n| n.updated_at).max() {
            Some(newest) if newest >= now => newest + Duration::milliseconds(1),
            _ => now,
        }
    }

    /// List every note, most recently updated first.
    ///
    /// Never fails: unreadable data is logged and treated as an empty collection.
    pub async fn list_all(&self) -> Vec<Note> {
        match self.load_sorted().await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(error = %e, "failed to load notes, falling back to empty list");
                Vec::new()
            }
        }
    }

    /// Get a note by ID.
    pub async fn get_by_id(&self, id: &str) -> Option<Note> {
        self.list_all().await.into_iter().find(|n| n.id == id)
    }

    /// Create a note and persist it at the front of the collection.
    pub async fn create(&self, note: CreateNote) -> Result<Note, Error> {
        let _guard = self.notes.lock().await;

        let mut notes = self.load_for_write().await;
        let now = self.stamp(&notes);
        let created = Note {
            id: generate_id(),
            title: note.title,
            content: note.content,
            category_id: note.category_id,
            created_at: now,
            updated_at: now,
        };

        notes.insert(0, created.clone());
        self.notes.save(&notes).await?;

        debug!(id = %created.id, "created note");
        Ok(created)
    }

    /// Merge `update` into the note with `id` and move it to the front.
    ///
    /// Returns `Ok(None)` if no such note exists.
    pub async fn update(&self, id: &str, update: UpdateNote) -> Result<Option<Note>, Error> {
        let _guard = self.notes.lock().await;

        let mut notes = self.load_for_write().await;
        let index = match notes.iter().position(|n| n.id == id) {
            Some(index) => index,
            None => return Ok(None),
        };

        let now = self.stamp(&notes);
        let mut note = notes.remove(index);
        update.apply_to(&mut note);
        note.updated_at = now;

        notes.insert(0, note.clone());
        self.notes.save(&notes).await?;

        debug!(id, "updated note");
        Ok(Some(note))
    }

    /// Delete a note by ID.
    ///
    /// Returns whether the remaining collection was persisted, regardless of
    /// whether a note with `id` existed.
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.notes.lock().await;

        let result = async {
            let mut notes = self.load_for_write().await;
            notes.retain(|n| n.id != id);
            self.notes.save(&notes).await
        }
        .await;

        match result {
            Ok(()) => {
                debug!(id, "deleted note");
                true
            }
            Err(e) => {
                error!(id, error = %e, "failed to delete note");
                false
            }
        }
    }

    /// Delete every note by dropping the stored collection.
    pub async fn reset(&self) -> Result<(), Error> {
        let _guard = self.notes.lock().await;
        self.notes.clear().await
    }

    /// Detach `category_id` from every note that references it.
    ///
    /// All affected notes are rewritten in a single write of the collection,
    /// so either every note is detached or none is. Returns whether that
    /// write succeeded.
    pub async fn clear_category_from_notes(&self, category_id: &str) -> bool {
        let _guard = self.notes.lock().await;

        let result = async {
            let mut notes = self.load_for_write().await;
            let now = self.stamp(&notes);
            let mut cleared = 0usize;
            for note in notes
                .iter_mut()
                .filter(|n| n.category_id.as_deref() == Some(category_id))
            {
                note.category_id = None;
                note.updated_at = now;
                cleared += 1;
            }
            notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            self.notes.save(&notes).await?;
            Ok::<_, Error>(cleared)
        }
        .await;

        match result {
            Ok(cleared) => {
                debug!(category_id, cleared, key = self.notes.key(), "cleared category from notes");
                true
            }
            Err(e) => {
                error!(category_id, error = %e, "failed to clear category from notes");
                false
            }
        }
    }
}
