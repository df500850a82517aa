use std::collections::BTreeSet;

use crate::Note;

/// Ids picked in the list screen's multi-select mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Select `id` if it is not selected, deselect it otherwise.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Deselect everything if every visible note is already selected,
    /// otherwise select exactly the visible notes.
    pub fn toggle_all(&mut self, visible: &[&Note]) {
        if !visible.is_empty() && self.ids.len() == visible.len() {
            self.ids.clear();
        } else {
            self.ids = visible.iter().map(|n| n.id.clone()).collect();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
