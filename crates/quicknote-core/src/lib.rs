//! QuickNote core library - notes, categories, and the stores and
//! view-models over them.
//!
//! This crate performs no I/O of its own: everything is persisted through a
//! [`KeyValueStore`], so any backend that can get and set a string by key
//! can host a note collection.

mod category;
mod category_store;
mod clock;
mod collection;
mod datefmt;
mod error;
mod filter;
mod id;
mod kv;
mod note;
mod note_store;
mod selection;
mod view_model;

#[cfg(test)]
mod testing;

pub use category::{default_categories, Category, UpdateCategory};
pub use category_store::{CategoryStore, CATEGORIES_KEY};
pub use clock::{Clock, FixedClock, SystemClock};
pub use datefmt::format_relative;
pub use error::Error;
pub use filter::{filter_notes, NoteFilter};
pub use id::generate_id;
pub use kv::{KeyValueStore, MemoryStore};
pub use note::{CreateNote, Note, NotePreview, NoteWithCategory, UpdateNote, DEFAULT_PREVIEW_LEN};
pub use note_store::{NoteStore, NOTES_KEY};
pub use selection::Selection;
pub use view_model::{CategoriesViewModel, NotesViewModel, UNTITLED};
