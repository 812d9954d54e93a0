//! Key-value persistence seam.
//!
//! Values are stored as text. Typed decoding lives in the settings store, so
//! a backend only has to move strings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;

pub trait KeyValueStore: Send {
    /// `Ok(None)` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn has_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Write every entry or none of them. A later `get` never observes a
    /// partially applied batch.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError>;
}

/// In-process store. Clones share the same map, so a test can keep a handle
/// to inspect what the state manager wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave the map half-written:
        // every mutation is a single insert or a loop under one guard.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.lock().remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());
        assert!(!store.has_key("k").unwrap());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert!(store.has_key("k").unwrap());
    }

    #[test]
    fn clones_share_entries() {
        let mut store = MemoryStore::new();
        let view = store.clone();
        store
            .set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.get("b").unwrap().as_deref(), Some("2"));
    }
}
