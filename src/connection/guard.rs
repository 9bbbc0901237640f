// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection bookkeeping.

use crate::core::state::StatsState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard that records a connection as active for as long as it lives,
/// so the counter is corrected on every exit path of the handler.
pub struct ConnectionGuard {
    stats: Arc<StatsState>,
    session_id: u64,
    addr: SocketAddr,
}

impl ConnectionGuard {
    pub(crate) fn new(stats: Arc<StatsState>, session_id: u64, addr: SocketAddr) -> Self {
        stats.connection_opened();
        Self {
            stats,
            session_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.connection_closed();
        debug!(
            "Session {}: connection {} released ({} still active).",
            self.session_id,
            self.addr,
            self.stats.get_active_connections()
        );
    }
}
