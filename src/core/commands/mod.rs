// src/core/commands/mod.rs

//! The commands shipped with the server.

pub mod get;

pub use get::Get;

use crate::core::handler::CommandRegistry;
use crate::core::storage::KeyValueStore;
use std::sync::Arc;

/// Registers every built-in command against `store`.
pub fn register_builtin(registry: &mut CommandRegistry, store: Arc<dyn KeyValueStore>) {
    registry.register(Get::NAME, Get::new(store));
}
