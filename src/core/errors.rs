// src/core/errors.rs

//! Defines the error types shared by the framing, dispatch and command layers.

use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

/// The main error enum for the server. Each variant corresponds to one stage of
/// the request pipeline, so callers can tell a broken stream apart from a bad
/// request or a failed write.
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// The byte stream ended or broke in the middle of a frame.
    #[error("Framing error: {0}")]
    Framing(String),

    /// A frame declared (or would need) a length outside the accepted range.
    #[error("Frame of {len} bytes exceeds the limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// The frame payload is not a valid request envelope.
    #[error("Malformed request: {0}")]
    Decode(String),

    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("Failed to encode response: {0}")]
    Encode(String),

    /// Writing a response frame back to the peer failed.
    #[error("Failed to write response: {0}")]
    Write(Arc<std::io::Error>),

    #[error("Store error: {0}")]
    Store(String),
}

impl AgentError {
    /// Returns true for errors that mean the peer simply went away.
    pub fn is_disconnect(&self) -> bool {
        match self {
            AgentError::Io(e) | AgentError::Write(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

impl PartialEq for AgentError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AgentError::Io(e1), AgentError::Io(e2))
            | (AgentError::Write(e1), AgentError::Write(e2)) => e1.kind() == e2.kind(),
            (AgentError::Framing(s1), AgentError::Framing(s2)) => s1 == s2,
            (
                AgentError::FrameTooLarge { len: l1, max: m1 },
                AgentError::FrameTooLarge { len: l2, max: m2 },
            ) => l1 == l2 && m1 == m2,
            (AgentError::Decode(s1), AgentError::Decode(s2)) => s1 == s2,
            (AgentError::UnknownMethod(s1), AgentError::UnknownMethod(s2)) => s1 == s2,
            (AgentError::Encode(s1), AgentError::Encode(s2)) => s1 == s2,
            (AgentError::Store(s1), AgentError::Store(s2)) => s1 == s2,
            _ => false,
        }
    }
}

impl From<std::io::Error> for AgentError {
    fn from(e: std::io::Error) -> Self {
        AgentError::Io(Arc::new(e))
    }
}

/// A failure reported by a command handler. It is never fatal to the
/// connection; the dispatcher serializes it into the `error` field of the
/// response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("value stored under '{key}' is malformed: {reason}")]
    MalformedValue { key: String, reason: String },

    #[error("store failure: {0}")]
    Store(String),

    #[error("{0}")]
    Custom(String),
}

impl CommandError {
    /// A stable, machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::InvalidParams(_) => "invalid_params",
            CommandError::KeyNotFound(_) => "key_not_found",
            CommandError::MalformedValue { .. } => "malformed_value",
            CommandError::Store(_) => "store_error",
            CommandError::Custom(_) => "error",
        }
    }

    /// The wire representation placed in `response.error`.
    pub fn to_value(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

impl From<AgentError> for CommandError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Store(s) => CommandError::Store(s),
            other => CommandError::Custom(other.to_string()),
        }
    }
}
