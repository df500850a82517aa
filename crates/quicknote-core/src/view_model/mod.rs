//! In-memory session state over the stores.
//!
//! Each view-model owns its store and a cache of the store's contents.
//! Commands take `&mut self`, so a session has exactly one writer, and each
//! command patches the cache from the store's result instead of reloading.

mod categories;
mod notes;

pub use categories::CategoriesViewModel;
pub use notes::{NotesViewModel, UNTITLED};
