// src/core/storage/mod.rs

//! The key-value store consumed by commands. The dispatch core never touches
//! it directly; commands receive a handle when they are registered.

pub mod memory;

pub use memory::MemoryStore;

use crate::core::AgentError;
use bytes::Bytes;

/// An opaque key to value lookup service.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>, AgentError>;
}
