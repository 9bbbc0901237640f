// src/core/handler/mod.rs

//! Command registration and request dispatch.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use registry::{
    BlockingFnHandler, CommandHandler, CommandRegistry, FnHandler, HandlerResult, blocking_fn,
    handler_fn,
};
