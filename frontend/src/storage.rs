//! LocalStorage behind the shared [`KeyValueStore`] seam.

use gloo_storage::{LocalStorage, Storage};
use shared::storage::{KeyValueStore, StorageError};

/// Browser LocalStorage. Values are stored as raw strings; JSON encoding is
/// done by the callers through `shared::storage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{:?}", e)))
    }

    fn remove(&self, key: &str) {
        if LocalStorage::raw().remove_item(key).is_err() {
            log::warn!("Failed to remove '{}' from local storage", key);
        }
    }
}
