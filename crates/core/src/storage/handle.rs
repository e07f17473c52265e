use std::sync::{Arc, RwLock};

use crate::storage::SeriesStore;

/// Shared, swappable reference to the current store.
///
/// Readers take an `Arc` snapshot and keep using it for the whole request; a reload builds a
/// complete new store and swaps it in one step, so nobody observes a partial update.
#[derive(Debug, Default)]
pub struct StoreHandle {
    current: RwLock<Arc<SeriesStore>>,
}

impl StoreHandle {
    pub fn new(store: SeriesStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    pub fn snapshot(&self) -> Arc<SeriesStore> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Installs `store`, returning the previous one.
    pub fn replace(&self, store: SeriesStore) -> Arc<SeriesStore> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(store))
    }
}
