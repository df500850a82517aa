use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Category;

/// Number of content characters shown in a preview.
pub const DEFAULT_PREVIEW_LEN: usize = 100;

/// A full note with all fields, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Weak reference to a [`Category`] id. May dangle after the category is deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note for listing (truncated content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePreview {
    pub id: String,
    pub title: String,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note paired with its category, if the reference resolves.
#[derive(Debug, Clone, Copy)]
pub struct NoteWithCategory<'a> {
    pub note: &'a Note,
    pub category: Option<&'a Category>,
}

/// Parameters for creating a new note.
#[derive(Debug, Default, Clone)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
}

/// Parameters for updating an existing note.
///
/// `category_id` is doubly optional: `None` keeps the current category,
/// `Some(None)` detaches it, `Some(Some(id))` assigns a new one.
#[derive(Debug, Default, Clone)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<String>>,
}

impl Note {
    /// Convert to a preview with content truncated to `max_len` characters.
    pub fn preview(&self, max_len: usize) -> NotePreview {
        let preview = if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let head: String = self.content.chars().take(max_len).collect();
            format!("{}...", head)
        };

        NotePreview {
            id: self.id.clone(),
            title: self.title.clone(),
            preview,
            category_id: self.category_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Resolve the category reference against `categories`.
    ///
    /// A dangling reference resolves to no category.
    pub fn with_category<'a>(&'a self, categories: &'a [Category]) -> NoteWithCategory<'a> {
        let category = self
            .category_id
            .as_deref()
            .and_then(|id| categories.iter().find(|c| c.id == id));
        NoteWithCategory {
            note: self,
            category,
        }
    }
}

impl UpdateNote {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.category_id.is_none()
    }

    /// Merge the provided fields into `note`. Timestamps are left to the caller.
    pub(crate) fn apply_to(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            note.content = content;
        }
        if let Some(category_id) = self.category_id {
            note.category_id = category_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_categories;
    use chrono::TimeZone;

    fn note(content: &str, category_id: Option<&str>) -> Note {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Note {
            id: "n1".to_string(),
            title: "Title".to_string(),
            content: content.to_string(),
            category_id: category_id.map(String::from),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_preview_short_content_untouched() {
        let preview = note("short", None).preview(DEFAULT_PREVIEW_LEN);
        assert_eq!(preview.preview, "short");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let preview = note("メモを書く", None).preview(2);
        assert_eq!(preview.preview, "メモ...");
    }

    #[test]
    fn test_dangling_category_resolves_to_none() {
        let categories = default_categories();
        let filed = note("", Some("work"));
        let resolved = filed.with_category(&categories);
        assert_eq!(resolved.category.map(|c| c.name.as_str()), Some("Work"));

        let orphan = note("", Some("deleted"));
        assert!(orphan.with_category(&categories).category.is_none());
    }

    #[test]
    fn test_serializes_camel_case_without_missing_category() {
        let json = serde_json::to_value(note("body", None)).unwrap();
        assert!(json.get("categoryId").is_none());
        assert_eq!(json["createdAt"], "2024-03-01T09:30:00Z");

        let json = serde_json::to_value(note("body", Some("ideas"))).unwrap();
        assert_eq!(json["categoryId"], "ideas");
    }

    #[test]
    fn test_reads_millisecond_timestamps() {
        let raw = r#"{"id":"1","title":"t","content":"c","createdAt":"2024-03-01T09:30:00.123Z","updatedAt":"2024-03-02T10:00:00.000Z"}"#;
        let parsed: Note = serde_json::from_str(raw).unwrap();
        assert!(parsed.category_id.is_none());
        assert!(parsed.updated_at > parsed.created_at);
    }

    #[test]
    fn test_update_can_detach_category() {
        let mut n = note("", Some("work"));
        UpdateNote {
            category_id: Some(None),
            ..Default::default()
        }
        .apply_to(&mut n);
        assert!(n.category_id.is_none());
    }
}
