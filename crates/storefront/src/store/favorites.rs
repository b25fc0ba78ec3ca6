//! Favorite products, an insertion-ordered set of ids.

use std::sync::Arc;

use kaay_core::ProductId;
use kaay_data::LocalStore;
use kaay_data::local::{load_json, save_json};

pub struct FavoritesStore {
    ids: Vec<ProductId>,
    persistence: Arc<dyn LocalStore>,
    key: String,
}

impl std::fmt::Debug for FavoritesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesStore")
            .field("key", &self.key)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl FavoritesStore {
    /// Restore the set persisted under `key`. Duplicates are dropped.
    pub fn load(persistence: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let stored: Vec<ProductId> = load_json(persistence.as_ref(), &key).unwrap_or_default();
        let mut ids: Vec<ProductId> = Vec::with_capacity(stored.len());
        for id in stored {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self {
            ids,
            persistence,
            key,
        }
    }

    /// Flip membership. Returns `true` if the product is now a favorite.
    pub fn toggle(&mut self, id: &ProductId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.add(id.clone());
            true
        }
    }

    /// Returns `false` if already present.
    pub fn add(&mut self, id: ProductId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        self.persist();
        true
    }

    /// Returns `false` if absent.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        let removed = self.ids.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.persist();
    }

    fn persist(&self) {
        save_json(self.persistence.as_ref(), &self.key, &self.ids);
    }
}
