// src/connection/mod.rs

//! Manages the lifecycle of a single client connection: frame reading,
//! concurrent dispatch, and serialized response writes.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;
mod writer;

// Publicly re-export the primary types from the sub-modules.
pub use handler::{CloseReason, ConnectionHandler};
pub use writer::ConnectionWriter;
