use tracing::error;

use crate::{Category, CategoryStore, Error, KeyValueStore, UpdateCategory};

/// Cached view of the [`CategoryStore`], in storage order.
pub struct CategoriesViewModel<S> {
    store: CategoryStore<S>,
    categories: Vec<Category>,
    loading: bool,
    error: Option<String>,
}

impl<S: KeyValueStore> CategoriesViewModel<S> {
    /// Wrap `store` and load its contents, seeding defaults on first use.
    pub async fn open(store: CategoryStore<S>) -> Self {
        let mut model = Self {
            store,
            categories: Vec::new(),
            loading: true,
            error: None,
        };
        model.reload().await;
        model
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message describing the last failed command, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn store(&self) -> &CategoryStore<S> {
        &self.store
    }

    /// Look a category up in the cache. Dangling ids resolve to `None`.
    pub fn get_by_id(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub async fn reload(&mut self) {
        self.loading = true;
        self.error = None;
        self.categories = self.store.list_all().await;
        self.loading = false;
    }

    fn fail(&mut self, message: &str, err: Error) -> Error {
        error!(error = %err, "{}", message);
        self.error = Some(message.to_string());
        err
    }

    /// Create a category. The name is trimmed and must not be blank.
    pub async fn create(&mut self, name: &str, color: &str) -> Result<Category, Error> {
        let name = normalize_name(name)?;
        self.error = None;

        match self.store.create(name, color.to_string()).await {
            Ok(category) => {
                self.categories.push(category.clone());
                Ok(category)
            }
            Err(e) => Err(self.fail("Failed to create category", e)),
        }
    }

    /// Update a category in place. Returns `Ok(None)` if it does not exist.
    pub async fn update(
        &mut self,
        id: &str,
        update: UpdateCategory,
    ) -> Result<Option<Category>, Error> {
        let update = UpdateCategory {
            name: update.name.as_deref().map(normalize_name).transpose()?,
            color: update.color,
        };
        self.error = None;

        match self.store.update(id, update).await {
            Ok(Some(category)) => {
                if let Some(cached) = self.categories.iter_mut().find(|c| c.id == id) {
                    *cached = category.clone();
                }
                Ok(Some(category))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(self.fail("Failed to update category", e)),
        }
    }

    /// Delete a category. Notes that reference it keep their reference.
    pub async fn delete(&mut self, id: &str) -> Result<(), Error> {
        self.error = None;

        if self.store.delete(id).await {
            self.categories.retain(|c| c.id != id);
            Ok(())
        } else {
            let err = Error::StorageWrite(format!("failed to delete category {}", id));
            Err(self.fail("Failed to delete category", err))
        }
    }
}

fn normalize_name(name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("category name cannot be empty".into()));
    }
    Ok(name.to_string())
}
