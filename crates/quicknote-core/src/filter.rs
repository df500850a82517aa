//! Derivation of the visible notes from the full list.

use std::collections::{BTreeSet, HashMap};

use crate::{Category, Note};

/// Criteria for the visible subset of notes.
///
/// The category gate and the text match compose with AND. An empty category
/// set and a blank query each let everything through.
#[derive(Debug, Default, Clone)]
pub struct NoteFilter {
    pub query: String,
    pub categories: BTreeSet<String>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_categories<I, T>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Notes from `notes` that pass the filter, in their original order.
    pub fn apply<'a>(&self, notes: &'a [Note], categories: &[Category]) -> Vec<&'a Note> {
        let by_id: HashMap<&str, &Category> =
            categories.iter().map(|c| (c.id.as_str(), c)).collect();
        let query = self.query.trim().to_lowercase();

        notes
            .iter()
            .filter(|note| self.passes_category_gate(note))
            .filter(|note| query.is_empty() || Self::matches_text(note, &by_id, &query))
            .collect()
    }

    fn passes_category_gate(&self, note: &Note) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        note.category_id
            .as_ref()
            .map(|id| self.categories.contains(id))
            .unwrap_or(false)
    }

    /// `query` must already be trimmed and lowercased.
    fn matches_text(note: &Note, categories: &HashMap<&str, &Category>, query: &str) -> bool {
        if note.title.to_lowercase().contains(query) || note.content.to_lowercase().contains(query)
        {
            return true;
        }
        note.category_id
            .as_deref()
            .and_then(|id| categories.get(id))
            .map(|c| c.name.to_lowercase().contains(query))
            .unwrap_or(false)
    }
}

/// Filter `notes` by free-text `query` and a set of selected category ids.
pub fn filter_notes<'a>(
    notes: &'a [Note],
    categories: &[Category],
    query: &str,
    selected: &BTreeSet<String>,
) -> Vec<&'a Note> {
    NoteFilter {
        query: query.to_string(),
        categories: selected.clone(),
    }
    .apply(notes, categories)
}
