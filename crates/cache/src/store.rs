use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::CacheKey;

/// Stored wrapper around a cached payload.
///
/// Persisted as `{"data": ..., "created": <ms>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "data")]
    pub payload: Value,
    #[serde(rename = "created")]
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("browser storage unavailable")]
    Unavailable,
    #[error("cache storage corrupt: {0}")]
    Corrupt(String),
    #[error("cache storage error: {0}")]
    Io(String),
}

/// Backing storage for [`crate::TtlCache`].
///
/// Methods take `&self`; implementations use interior mutability so one
/// store can be shared by every cache consumer on the page.
pub trait CacheStore {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;
    fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), StoreError>;
    fn remove(&self, key: &CacheKey) -> Result<(), StoreError>;
}

/// Process-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

pub const DEFAULT_STORE_PREFIX: &str = "spelunker.cache.";

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{CacheEntry, CacheStore, StoreError};
    use crate::key::CacheKey;

    /// `window.localStorage`, one item per cache key.
    #[derive(Debug)]
    pub struct LocalStorageStore {
        key_prefix: String,
        storage: web_sys::Storage,
    }

    impl LocalStorageStore {
        pub fn new(prefix: impl Into<String>) -> Result<Self, StoreError> {
            Ok(Self {
                key_prefix: prefix.into(),
                storage: window_local_storage()?,
            })
        }

        fn item_key(&self, key: &CacheKey) -> String {
            format!("{}{}", self.key_prefix, key.as_str())
        }
    }

    impl CacheStore for LocalStorageStore {
        fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
            let raw = self
                .storage
                .get_item(&self.item_key(key))
                .map_err(|e| StoreError::Io(format!("get_item failed: {:?}", e)))?;
            let Some(raw) = raw else {
                return Ok(None);
            };
            if raw.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str::<CacheEntry>(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string()))
        }

        fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), StoreError> {
            let raw = serde_json::to_string(entry).map_err(|e| StoreError::Io(e.to_string()))?;
            self.storage
                .set_item(&self.item_key(key), &raw)
                .map_err(|e| StoreError::Io(format!("set_item failed: {:?}", e)))
        }

        fn remove(&self, key: &CacheKey) -> Result<(), StoreError> {
            self.storage
                .remove_item(&self.item_key(key))
                .map_err(|e| StoreError::Io(format!("remove_item failed: {:?}", e)))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, StoreError> {
        let win = web_sys::window().ok_or(StoreError::Unavailable)?;
        win.local_storage()
            .map_err(|e| StoreError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStorageStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStorageStore {
    pub fn new(_prefix: impl Into<String>) -> Result<Self, StoreError> {
        Err(StoreError::Unavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CacheStore for LocalStorageStore {
    fn load(&self, _key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&self, _key: &CacheKey, _entry: &CacheEntry) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    fn remove(&self, _key: &CacheKey) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}
