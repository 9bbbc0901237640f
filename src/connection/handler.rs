// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use super::writer::ConnectionWriter;
use crate::core::AgentError;
use crate::core::handler::{DispatchOutcome, Dispatcher};
use crate::core::protocol::{FrameCodec, Request};
use crate::core::state::StatsState;
use crate::server::shutdown_signalled;
use bytes::Bytes;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

/// Why the read side of a connection stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseReason {
    /// The peer closed the stream between frames.
    PeerClosed,
    /// The server is shutting down.
    Shutdown,
    /// The stream broke or carried an invalid frame.
    Failed(AgentError),
}

/// Owns one accepted connection: reads frames in order and dispatches each
/// request as its own task, so a slow handler never holds up the next read.
pub struct ConnectionHandler<S> {
    reader: FramedRead<ReadHalf<S>, FrameCodec>,
    writer: ConnectionWriter<WriteHalf<S>>,
    addr: SocketAddr,
    session_id: u64,
    dispatcher: Dispatcher,
    stats: Arc<StatsState>,
    shutdown_rx: watch::Receiver<bool>,
    dispatches: JoinSet<()>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Creates a new `ConnectionHandler`.
    pub fn new(
        stream: S,
        addr: SocketAddr,
        session_id: u64,
        dispatcher: Dispatcher,
        codec: FrameCodec,
        stats: Arc<StatsState>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FramedRead::new(read_half, codec),
            writer: ConnectionWriter::new(write_half, codec),
            addr,
            session_id,
            dispatcher,
            stats,
            shutdown_rx,
            dispatches: JoinSet::new(),
        }
    }

    /// The main event loop for the connection.
    ///
    /// Returns once the read side has stopped and every dispatch spawned by
    /// this connection has finished.
    pub async fn run(mut self) -> CloseReason {
        let _guard = ConnectionGuard::new(self.stats.clone(), self.session_id, self.addr);
        info!("Session {}: new connection from {}", self.session_id, self.addr);

        let mut shutdown_rx = self.shutdown_rx.clone();
        let reason = loop {
            tokio::select! {
                // Prioritize the shutdown signal so no new work is admitted once it fires.
                biased;
                _ = shutdown_signalled(&mut shutdown_rx) => {
                    info!("Session {}: server is stopping, no longer reading from {}.", self.session_id, self.addr);
                    break CloseReason::Shutdown;
                }
                Some(res) = self.dispatches.join_next() => {
                    if let Err(e) = res
                        && e.is_panic()
                    {
                        error!("Session {}: a dispatch task panicked: {e:?}", self.session_id);
                    }
                }
                frame = self.reader.next() => {
                    match frame {
                        Some(Ok(payload)) => self.process_frame(payload),
                        Some(Err(e)) => {
                            if e.is_disconnect() {
                                debug!("Session {}: connection from {} closed by peer: {}", self.session_id, self.addr, e);
                            } else {
                                warn!("Session {}: read failed for {}: {}", self.session_id, self.addr, e);
                            }
                            break CloseReason::Failed(e);
                        }
                        None => {
                            debug!("Session {}: connection from {} closed by peer.", self.session_id, self.addr);
                            break CloseReason::PeerClosed;
                        }
                    }
                }
            }
        };

        self.drain().await;
        if let Err(e) = self.writer.shutdown().await {
            debug!("Session {}: write shutdown for {} failed: {}", self.session_id, self.addr, e);
        }
        reason
    }

    /// Decodes a frame payload and spawns its dispatch. A malformed payload is
    /// logged and dropped; the connection keeps reading.
    fn process_frame(&mut self, payload: Bytes) {
        let request = match Request::from_slice(&payload) {
            Ok(request) => request,
            Err(e) => {
                self.stats.increment_decode_errors();
                warn!("Session {}: dropping malformed request from {}: {}", self.session_id, self.addr, e);
                return;
            }
        };
        debug!(
            "Session {}: received request {} for '{}'",
            self.session_id, request.id, request.method
        );

        let dispatcher = self.dispatcher.clone();
        let writer = self.writer.clone();
        let session_id = self.session_id;
        self.dispatches.spawn(async move {
            let id = request.id;
            let method = request.method.clone();
            match dispatcher.dispatch(request, &writer).await {
                Ok(DispatchOutcome::Replied) => {
                    debug!("Session {}: replied to request {} ('{}')", session_id, id, method);
                }
                Ok(DispatchOutcome::HandlerFailed) => {
                    debug!("Session {}: request {} ('{}') failed in its handler", session_id, id, method);
                }
                Err(AgentError::UnknownMethod(name)) => {
                    warn!("Session {}: unknown method '{}' in request {}; no response sent.", session_id, name, id);
                }
                Err(e) => {
                    warn!("Session {}: could not deliver response to request {} ('{}'): {}", session_id, id, method, e);
                }
            }
        });
    }

    /// Waits for every in-flight dispatch of this connection to finish.
    async fn drain(&mut self) {
        if !self.dispatches.is_empty() {
            debug!(
                "Session {}: waiting for {} in-flight request(s).",
                self.session_id,
                self.dispatches.len()
            );
        }
        while let Some(res) = self.dispatches.join_next().await {
            if let Err(e) = res
                && e.is_panic()
            {
                error!("Session {}: a dispatch task panicked: {e:?}", self.session_id);
            }
        }
    }
}
