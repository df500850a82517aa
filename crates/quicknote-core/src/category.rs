use serde::{Deserialize, Serialize};

/// A named, colored tag that notes can point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display color as a hex string, e.g. `#FF6B6B`.
    pub color: String,
}

/// Parameters for updating an existing category. `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
}

const DEFAULT_CATEGORIES: [(&str, &str, &str); 5] = [
    ("personal", "Personal", "#FF6B6B"),
    ("work", "Work", "#4ECDC4"),
    ("ideas", "Ideas", "#45B7D1"),
    ("todo", "Todo", "#96CEB4"),
    ("important", "Important", "#FFEAA7"),
];

/// The categories seeded on first launch.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(id, name, color)| Category {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect()
}

impl UpdateCategory {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }

    /// Merge the provided fields into `category`.
    pub(crate) fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
    }
}
