//! Durable key-value storage seam.
//!
//! In the browser this is LocalStorage; tests use [`MemoryStore`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const TV_SELECTION_KEY: &str = "tv_selection";
pub const TV_SETTINGS_KEY: &str = "tv_settings";
pub const TV_COMMAND_KEY: &str = "tv_command";
pub const BOARD_CONFIG_KEY: &str = "board_config";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Storage write failed: {0}")]
    Write(String),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// Read and decode a JSON value. Missing keys are `None`; corrupt values are
/// logged and also treated as missing.
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt value under '{}': {}", key, e);
            None
        }
    }
}

pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// In-memory store. Clones share the same entries, which lets tests model
/// two browser contexts looking at one storage area.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
