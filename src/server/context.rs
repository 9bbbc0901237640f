// src/server/context.rs

use crate::core::handler::Dispatcher;
use crate::core::protocol::FrameCodec;
use crate::core::state::StatsState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};

/// Holds all the initialized state required to run the accept loop.
pub struct ServerContext {
    pub listener: TcpListener,
    pub dispatcher: Dispatcher,
    pub codec: FrameCodec,
    pub stats: Arc<StatsState>,
    pub shutdown_rx: watch::Receiver<bool>,
    pub connection_permits: Arc<Semaphore>,
}

/// Resolves once shutdown has been requested, or once the sender is gone
/// (dropping the `ServerHandle` counts as a stop request).
pub async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
