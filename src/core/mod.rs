// src/core/mod.rs

//! The central module containing the protocol, dispatch and command logic.

pub mod commands;
pub mod errors;
pub mod handler;
pub mod protocol;
pub mod state;
pub mod storage;

pub use errors::{AgentError, CommandError};
pub use protocol::{Request, Response};
