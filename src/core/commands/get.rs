// src/core/commands/get.rs

use crate::core::CommandError;
use crate::core::handler::{CommandHandler, HandlerResult};
use crate::core::storage::KeyValueStore;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Looks up a key in the store and returns the JSON value stored there.
///
/// Params: a JSON string holding the key.
#[derive(Clone)]
pub struct Get {
    store: Arc<dyn KeyValueStore>,
}

impl Get {
    pub const NAME: &'static str = "Get";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for Get {
    async fn invoke(&self, params: Value) -> HandlerResult {
        let key = match &params {
            Value::String(key) => key.as_str(),
            other => {
                return Err(CommandError::InvalidParams(format!(
                    "Get expects a string key, got {}",
                    json_kind(other)
                )));
            }
        };
        debug!("Get: looking up key '{}'", key);

        let chunk = self
            .store
            .get(key.as_bytes())
            .map_err(CommandError::from)?
            .ok_or_else(|| CommandError::KeyNotFound(key.to_string()))?;

        serde_json::from_slice(&chunk).map_err(|e| CommandError::MalformedValue {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
