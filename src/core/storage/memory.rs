// src/core/storage/memory.rs

//! An in-memory `KeyValueStore`, optionally seeded from a JSON file.

use super::KeyValueStore;
use crate::core::AgentError;
use bytes::Bytes;
use dashmap::DashMap;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// A concurrent in-memory store backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<Bytes, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store populated from a JSON seed file. See [`MemoryStore::load_seed`].
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Store(format!(
                "failed to read seed file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let store = Self::new();
        let loaded = store.load_seed(&contents)?;
        info!("Loaded {} keys from seed file '{}'.", loaded, path.display());
        Ok(store)
    }

    /// Loads a JSON object of `key -> value` pairs. Each value is stored as its
    /// compact JSON encoding. Returns the number of keys loaded.
    pub fn load_seed(&self, json: &str) -> Result<usize, AgentError> {
        let seed: Value = serde_json::from_str(json)
            .map_err(|e| AgentError::Store(format!("invalid seed JSON: {e}")))?;
        let Value::Object(map) = seed else {
            return Err(AgentError::Store(
                "seed must be a JSON object of key/value pairs".to_string(),
            ));
        };

        let count = map.len();
        for (key, value) in map {
            let encoded = serde_json::to_vec(&value)
                .map_err(|e| AgentError::Store(format!("failed to encode '{key}': {e}")))?;
            self.entries.insert(Bytes::from(key), Bytes::from(encoded));
        }
        Ok(count)
    }

    /// Stores raw bytes under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Option<Bytes> {
        self.entries.insert(key.into(), value.into())
    }

    /// Stores the JSON encoding of `value` under `key`.
    pub fn insert_json(&self, key: impl Into<Bytes>, value: &Value) -> Result<(), AgentError> {
        let encoded =
            serde_json::to_vec(value).map_err(|e| AgentError::Store(e.to_string()))?;
        self.entries.insert(key.into(), Bytes::from(encoded));
        Ok(())
    }

    pub fn remove(&self, key: &[u8]) -> Option<Bytes> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, AgentError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}
