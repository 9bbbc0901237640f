// src/core/protocol/message.rs

//! The request and response envelopes carried inside frames.

use crate::core::{AgentError, CommandError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client request. `id` is chosen by the client and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    // Clients that serialize untagged Go structs send capitalized keys.
    #[serde(alias = "Id", alias = "ID")]
    pub id: u32,
    #[serde(alias = "Method")]
    pub method: String,
    /// Handler-specific parameters; `null` when the client omits them.
    #[serde(default, alias = "Params")]
    pub params: Value,
}

impl Request {
    pub fn new(id: u32, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Parses a request from a frame payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, AgentError> {
        serde_json::from_slice(payload).map_err(|e| AgentError::Decode(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Bytes, AgentError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| AgentError::Encode(e.to_string()))
    }
}

/// The reply to a single request.
///
/// Both `result` and `error` are always present on the wire; the side that does
/// not apply is `null`. The constructors guarantee that at most one of them is
/// populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u32,
    pub result: Option<Value>,
    pub error: Option<Value>,
}

impl Response {
    pub fn success(id: u32, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u32, error: Value) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Builds the response for a handler's outcome.
    pub fn from_outcome(id: u32, outcome: Result<Value, CommandError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(e) => Self::failure(id, e.to_value()),
        }
    }

    /// True if the response carries a non-null `error`.
    pub fn is_error(&self) -> bool {
        matches!(&self.error, Some(e) if !e.is_null())
    }

    pub fn from_slice(payload: &[u8]) -> Result<Self, AgentError> {
        serde_json::from_slice(payload).map_err(|e| AgentError::Decode(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Bytes, AgentError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| AgentError::Encode(e.to_string()))
    }
}
