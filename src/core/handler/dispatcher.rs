// src/core/handler/dispatcher.rs

//! Resolves a request to its handler, runs it, and writes the response.
//!
//! Each stage reports its own `AgentError` variant so the caller can tell an
//! unknown method apart from an encoding or write failure. Handler failures are
//! not errors at this level: they become the `error` field of the response.

use super::registry::CommandRegistry;
use crate::connection::ConnectionWriter;
use crate::core::protocol::{Request, Response};
use crate::core::state::StatsState;
use crate::core::AgentError;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::{Instrument, debug_span};

/// What a completed dispatch sent back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler succeeded and its result was written.
    Replied,
    /// The handler failed and its error was written.
    HandlerFailed,
}

/// Routes requests to handlers. Cheap to clone; every dispatch task gets its
/// own copy.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    stats: Arc<StatsState>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, stats: Arc<StatsState>) -> Self {
        Self { registry, stats }
    }

    /// Looks up and invokes the handler for `request`, producing its response.
    pub async fn execute(&self, request: &Request) -> Result<Response, AgentError> {
        let handler = self.registry.lookup(&request.method).ok_or_else(|| {
            self.stats.increment_unknown_methods();
            AgentError::UnknownMethod(request.method.clone())
        })?;

        self.stats.increment_total_requests();
        let span = debug_span!("command", method = %request.method, id = request.id);
        let outcome = handler.invoke(request.params.clone()).instrument(span).await;
        if outcome.is_err() {
            self.stats.increment_handler_errors();
        }
        Ok(Response::from_outcome(request.id, outcome))
    }

    /// Runs the full dispatch for one request and writes the response frame to
    /// `writer`. Nothing is written for an unknown method.
    pub async fn dispatch<W>(
        &self,
        request: Request,
        writer: &ConnectionWriter<W>,
    ) -> Result<DispatchOutcome, AgentError>
    where
        W: AsyncWrite + Unpin,
    {
        let response = self.execute(&request).await?;
        let outcome = if response.is_error() {
            DispatchOutcome::HandlerFailed
        } else {
            DispatchOutcome::Replied
        };

        let payload = response.to_bytes().inspect_err(|_| {
            self.stats.increment_encode_errors();
        })?;
        writer.send_frame(payload).await.inspect_err(|_| {
            self.stats.increment_write_errors();
        })?;
        Ok(outcome)
    }
}
