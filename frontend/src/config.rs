use shared::config::BoardConfig;
use shared::storage::{KeyValueStore, BOARD_CONFIG_KEY};

use crate::storage::BrowserStorage;

/// Board configuration: defaults, overridden by a JSON document stored under
/// `board_config` when present.
pub fn load() -> BoardConfig {
    load_from(&BrowserStorage)
}

pub fn load_from<S: KeyValueStore>(storage: &S) -> BoardConfig {
    match storage.get(BOARD_CONFIG_KEY) {
        None => BoardConfig::default(),
        Some(raw) => BoardConfig::from_json(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid board configuration: {}", e);
            BoardConfig::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::storage::MemoryStore;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_missing_override_uses_defaults() {
        let storage = MemoryStore::new();
        assert_eq!(load_from(&storage), BoardConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_partial_override() {
        let storage = MemoryStore::new();
        storage
            .set(BOARD_CONFIG_KEY, r#"{"timezone":"Asia/Manila","feed_page_size":5}"#)
            .unwrap();

        let config = load_from(&storage);

        assert_eq!(config.timezone, "Asia/Manila");
        assert_eq!(config.feed_page_size, 5);
        assert_eq!(config.api_base, "/api");
    }

    #[wasm_bindgen_test]
    fn test_invalid_override_falls_back() {
        let storage = MemoryStore::new();
        storage.set(BOARD_CONFIG_KEY, "{broken").unwrap();
        assert_eq!(load_from(&storage), BoardConfig::default());
    }
}
