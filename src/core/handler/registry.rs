// src/core/handler/registry.rs

//! The command registry: maps a method name to the handler that serves it.
//!
//! The registry is populated while the server is being set up and is frozen
//! into an `Arc` when the server starts. After that point it is only read, which
//! is why it carries no lock of its own.

use crate::core::CommandError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// The value a handler produces: a result on success or a `CommandError`.
pub type HandlerResult = Result<Value, CommandError>;

/// A unit of application logic bound to a command name.
///
/// Implementors hold whatever context they need (a store handle, config, ...)
/// as fields, so the registry never has to know about it.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Executes the command with the caller-supplied parameters.
    async fn invoke(&self, params: Value) -> HandlerResult;
}

/// Adapts an async closure into a `CommandHandler`.
pub struct FnHandler<F> {
    f: F,
}

/// Wraps an async closure `Fn(Value) -> impl Future<Output = HandlerResult>`.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn invoke(&self, params: Value) -> HandlerResult {
        (self.f)(params).await
    }
}

/// Adapts a synchronous, possibly blocking closure into a `CommandHandler`.
///
/// The closure runs on Tokio's blocking pool so it cannot stall the runtime
/// workers that drive connection reads and other dispatches.
pub struct BlockingFnHandler<F> {
    f: Arc<F>,
}

/// Wraps a synchronous closure `Fn(Value) -> HandlerResult`.
pub fn blocking_fn<F>(f: F) -> BlockingFnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
{
    BlockingFnHandler { f: Arc::new(f) }
}

#[async_trait]
impl<F> CommandHandler for BlockingFnHandler<F>
where
    F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
{
    async fn invoke(&self, params: Value) -> HandlerResult {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || f(params)).await {
            Ok(result) => result,
            Err(e) => Err(CommandError::Custom(format!("handler task failed: {e}"))),
        }
    }
}

/// Maps command names to their handlers. Names are matched exactly.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing and returning any handler
    /// previously registered under the same name.
    pub fn register<H>(
        &mut self,
        name: impl Into<String>,
        handler: H,
    ) -> Option<Arc<dyn CommandHandler>>
    where
        H: CommandHandler + 'static,
    {
        self.register_arc(name, Arc::new(handler))
    }

    /// Registers an already shared handler, e.g. one served under several names.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.insert(name.into(), handler)
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
