// src/server/mod.rs

//! Server lifecycle: registration, startup, accepting, and graceful shutdown.

use crate::config::Config;
use crate::core::commands;
use crate::core::handler::{CommandHandler, CommandRegistry};
use crate::core::state::StatsState;
use crate::core::storage::KeyValueStore;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

mod accept_loop;
mod context;
mod initialization;

pub use accept_loop::{AcceptErrorClass, classify_accept_error, handle_accept_error};
pub(crate) use context::shutdown_signalled;

/// A server that has not started yet. Commands can only be registered here;
/// `start` consumes the server and freezes its registry.
pub struct Server {
    config: Config,
    registry: CommandRegistry,
    stats: Arc<StatsState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: CommandRegistry::new(),
            stats: Arc::new(StatsState::new()),
        }
    }

    /// Registers `handler` under `name`. A later registration for the same
    /// name replaces the earlier one.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> &mut Self
    where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        if self.registry.register(name.clone(), handler).is_some() {
            info!("Command '{}' re-registered; the previous handler was replaced.", name);
        }
        self
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Binds `addr` and starts accepting connections in the background.
    pub async fn start(self, addr: &str) -> Result<ServerHandle> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = initialization::setup(
            addr,
            &self.config,
            self.registry,
            self.stats.clone(),
            shutdown_rx,
        )
        .await?;
        let local_addr = ctx.listener.local_addr()?;
        let accept_task = tokio::spawn(accept_loop::run(ctx));

        Ok(ServerHandle {
            local_addr,
            stats: self.stats,
            shutdown_tx,
            accept_task,
        })
    }
}

/// A handle to a running server.
///
/// Dropping the handle without calling `stop` also requests shutdown, but
/// nothing waits for the drain to finish.
pub struct ServerHandle {
    local_addr: SocketAddr,
    stats: Arc<StatsState>,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> &Arc<StatsState> {
        &self.stats
    }

    /// Stops accepting, stops reading from every connection, and waits until
    /// every connection and every request already being dispatched has
    /// finished writing its response.
    pub async fn stop(self) {
        info!("Stopping server on {}.", self.local_addr);
        self.shutdown_tx.send_replace(true);
        if let Err(e) = self.accept_task.await {
            error!("Accept loop terminated abnormally: {e:?}");
        }
        info!(
            "Server shutdown complete. Final stats: {:?}",
            self.stats.snapshot()
        );
    }
}

/// Runs the server described by `config` with the built-in commands until
/// SIGINT or SIGTERM, then stops it gracefully.
pub async fn run(config: Config, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let addr = config.listen_addr();
    let mut server = Server::new(config);
    commands::register_builtin(server.registry_mut(), store);

    let handle = server.start(&addr).await?;
    wait_for_termination().await?;
    handle.stop().await;
    Ok(())
}

async fn wait_for_termination() -> Result<()> {
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
        _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
    }
    Ok(())
}
