// src/server/initialization.rs

//! Binds the listener and assembles everything the accept loop needs.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::handler::{CommandRegistry, Dispatcher};
use crate::core::protocol::FrameCodec;
use crate::core::state::StatsState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tracing::{info, warn};

/// Binds `addr` and freezes the registry for the lifetime of the server.
pub async fn setup(
    addr: &str,
    config: &Config,
    registry: CommandRegistry,
    stats: Arc<StatsState>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<ServerContext> {
    log_registered_commands(&registry);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind listener on '{addr}'"))?;
    let local_addr = listener.local_addr()?;
    info!("agentd server listening on {}", local_addr);

    let registry = Arc::new(registry);
    Ok(ServerContext {
        listener,
        dispatcher: Dispatcher::new(registry, stats.clone()),
        codec: FrameCodec::with_max_frame_length(config.max_frame_length),
        stats,
        shutdown_rx,
        connection_permits: Arc::new(Semaphore::new(config.max_clients)),
    })
}

fn log_registered_commands(registry: &CommandRegistry) {
    if registry.is_empty() {
        warn!("No commands are registered; every request will be dropped as unknown.");
    } else {
        info!(
            "Registered {} command(s): {}",
            registry.len(),
            registry.names().join(", ")
        );
    }
}
