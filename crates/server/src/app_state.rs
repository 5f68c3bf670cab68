use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::Store;

pub(crate) struct AppState {
    store: Mutex<Store>,
}

impl AppState {
    pub(crate) fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
