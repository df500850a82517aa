use tracing::{debug, error, warn};

use crate::collection::Collection;
use crate::{default_categories, generate_id, Category, Error, KeyValueStore, UpdateCategory};

/// Storage key holding the JSON array of categories.
pub const CATEGORIES_KEY: &str = "quicknote_categories";

/// Durable CRUD over the full category collection, kept in storage order.
pub struct CategoryStore<S> {
    categories: Collection<S>,
}

impl<S: KeyValueStore> CategoryStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            categories: Collection::new(store, CATEGORIES_KEY),
        }
    }

    /// The underlying provider.
    pub fn store(&self) -> &S {
        self.categories.store()
    }

    /// Load the collection for a mutation. Nothing persisted yet, or data that
    /// cannot be read, means the defaults.
    async fn load_for_write(&self) -> Vec<Category> {
        match self.categories.load().await {
            Ok(Some(categories)) => categories,
            Ok(None) => default_categories(),
            Err(e) => {
                warn!(error = %e, "failed to load categories, starting from defaults");
                default_categories()
            }
        }
    }

    /// List every category in storage order.
    ///
    /// The first call on an empty store seeds and persists the default
    /// categories. Never fails: unreadable data is logged and the defaults
    /// are returned without being written.
    pub async fn list_all(&self) -> Vec<Category> {
        // Held from the read through the seeding write so a concurrent
        // create is never overwritten by the defaults.
        let _guard = self.categories.lock().await;
        match self.categories.load().await {
            Ok(Some(categories)) => categories,
            Ok(None) => {
                let defaults = default_categories();
                match self.categories.save(&defaults).await {
                    Ok(()) => debug!("seeded default categories"),
                    Err(e) => warn!(error = %e, "failed to persist default categories"),
                }
                defaults
            }
            Err(e) => {
                warn!(error = %e, "failed to load categories, falling back to defaults");
                default_categories()
            }
        }
    }

    /// Get a category by ID.
    pub async fn get_by_id(&self, id: &str) -> Option<Category> {
        self.list_all().await.into_iter().find(|c| c.id == id)
    }

    /// Append a new category and persist the collection.
    pub async fn create(&self, name: String, color: String) -> Result<Category, Error> {
        let _guard = self.categories.lock().await;

        let mut categories = self.load_for_write().await;
        let category = Category {
            id: generate_id(),
            name,
            color,
        };
        categories.push(category.clone());
        self.categories.save(&categories).await?;

        debug!(id = %category.id, "created category");
        Ok(category)
    }

    /// Merge `update` into the category with `id`, keeping its position.
    ///
    /// Returns `Ok(None)` if no such category exists.
    pub async fn update(
        &self,
        id: &str,
        update: UpdateCategory,
    ) -> Result<Option<Category>, Error> {
        let _guard = self.categories.lock().await;

        let mut categories = self.load_for_write().await;
        let category = match categories.iter_mut().find(|c| c.id == id) {
            Some(category) => category,
            None => return Ok(None),
        };
        update.apply_to(category);
        let updated = category.clone();

        self.categories.save(&categories).await?;

        debug!(id, "updated category");
        Ok(Some(updated))
    }

    /// Drop the stored collection. The next listing seeds the defaults again.
    pub async fn reset(&self) -> Result<(), Error> {
        let _guard = self.categories.lock().await;
        self.categories.clear().await
    }

    /// Delete a category by ID. Notes referencing it are left untouched.
    ///
    /// Returns whether the remaining collection was persisted, regardless of
    /// whether a category with `id` existed.
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.categories.lock().await;

        let result = async {
            let mut categories = self.load_for_write().await;
            categories.retain(|c| c.id != id);
            self.categories.save(&categories).await
        }
        .await;

        match result {
            Ok(()) => {
                debug!(id, "deleted category");
                true
            }
            Err(e) => {
                error!(id, error = %e, "failed to delete category");
                false
            }
        }
    }
}
