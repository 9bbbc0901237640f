// src/server/accept_loop.rs

//! Contains the main server loop for accepting connections and draining them on shutdown.

use super::context::{ServerContext, shutdown_signalled};
use crate::connection::{CloseReason, ConnectionHandler};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long to pause accepting after the process ran out of descriptors or memory.
const RESOURCE_EXHAUSTED_BACKOFF: Duration = Duration::from_millis(100);

/// How the accept loop reacts to a failed `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptErrorClass {
    /// A single pending connection failed; keep accepting.
    Transient,
    /// The process is out of descriptors, buffers or memory; back off, then keep accepting.
    ResourceExhausted,
    /// The listener itself is unusable; stop accepting.
    Fatal,
}

/// Classifies an `accept` error.
pub fn classify_accept_error(e: &io::Error) -> AcceptErrorClass {
    if let Some(code) = e.raw_os_error()
        && matches!(
            code,
            libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM
        )
    {
        return AcceptErrorClass::ResourceExhausted;
    }
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut => AcceptErrorClass::Transient,
        io::ErrorKind::OutOfMemory => AcceptErrorClass::ResourceExhausted,
        _ => AcceptErrorClass::Fatal,
    }
}

/// Logs a failed `accept` and applies its class. A fatal error drops the
/// listener so later connection attempts are refused instead of queueing in
/// the kernel backlog.
pub async fn handle_accept_error(
    e: &io::Error,
    listener: &mut Option<TcpListener>,
) -> AcceptErrorClass {
    let class = classify_accept_error(e);
    match class {
        AcceptErrorClass::Transient => {
            warn!("Failed to accept connection: {}", e);
        }
        AcceptErrorClass::ResourceExhausted => {
            error!("Failed to accept connection: {}. Backing off.", e);
            tokio::time::sleep(RESOURCE_EXHAUSTED_BACKOFF).await;
        }
        AcceptErrorClass::Fatal => {
            error!("CRITICAL: listener failed: {}. No longer accepting connections.", e);
            *listener = None;
        }
    }
    class
}

/// Accepts on the listener if it is still open; never resolves otherwise.
async fn accept_next(listener: &Option<TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

/// Accepts connections until shutdown is requested, then closes the listener
/// and waits for every connection (and its in-flight requests) to finish.
pub async fn run(ctx: ServerContext) {
    let ServerContext {
        listener,
        dispatcher,
        codec,
        stats,
        mut shutdown_rx,
        connection_permits,
    } = ctx;

    let mut listener = Some(listener);
    let mut session_id_counter: u64 = 0;
    let mut client_tasks = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = shutdown_signalled(&mut shutdown_rx) => {
                info!("Shutdown requested, no longer accepting connections.");
                break;
            }

            res = accept_next(&listener), if listener.is_some() => {
                match res {
                    Ok((socket, addr)) => {
                        let Ok(permit) = connection_permits.clone().try_acquire_owned() else {
                            stats.increment_rejected_connections();
                            warn!("Rejecting connection from {}: max_clients reached.", addr);
                            drop(socket);
                            continue;
                        };
                        if let Err(e) = socket.set_nodelay(true) {
                            debug!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }

                        session_id_counter = session_id_counter.wrapping_add(1);
                        let handler = ConnectionHandler::new(
                            socket,
                            addr,
                            session_id_counter,
                            dispatcher.clone(),
                            codec,
                            stats.clone(),
                            shutdown_rx.clone(),
                        );
                        client_tasks.spawn(async move {
                            if let CloseReason::Failed(e) = handler.run().await
                                && !e.is_disconnect()
                            {
                                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
                            }
                            drop(permit);
                        });
                    }
                    Err(e) => {
                        handle_accept_error(&e, &mut listener).await;
                    }
                }
            }

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            }
        }
    }

    drop(listener);
    info!(
        "Listener closed. Waiting for {} open connection(s) to drain.",
        client_tasks.len()
    );
    while let Some(res) = client_tasks.join_next().await {
        if let Err(e) = res
            && e.is_panic()
        {
            error!("A client handler panicked: {e:?}");
        }
    }
    info!("All client connections closed.");
}
