// src/core/state/stats.rs

//! Contains state definitions and logic for server statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds the server-wide counters. All operations are lock-free and may be
/// called from any connection or dispatch task.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted by the server since startup.
    total_connections: AtomicU64,
    /// The number of connections whose handler is currently running.
    active_connections: AtomicU64,
    /// The number of connections closed because `max_clients` was reached.
    rejected_connections: AtomicU64,
    /// The total number of requests handed to the dispatcher.
    total_requests: AtomicU64,
    /// Requests naming a method with no registered handler.
    unknown_methods: AtomicU64,
    /// Frames whose payload was not a valid request.
    decode_errors: AtomicU64,
    /// Requests whose handler reported a failure.
    handler_errors: AtomicU64,
    /// Responses that could not be serialized.
    encode_errors: AtomicU64,
    /// Responses that could not be written to the peer.
    write_errors: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub rejected_connections: u64,
    pub total_requests: u64,
    pub unknown_methods: u64,
    pub decode_errors: u64,
    pub handler_errors: u64,
    pub encode_errors: u64,
    pub write_errors: u64,
}

impl StatsState {
    /// Creates a new `StatsState` with zeroed counters.
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            unknown_methods: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Records a newly opened connection.
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a closed connection.
    pub fn connection_closed(&self) {
        // Saturate rather than wrap if a close is ever recorded twice.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn increment_rejected_connections(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_total_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unknown_methods(&self) {
        self.unknown_methods.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_decode_errors(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_handler_errors(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_encode_errors(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_write_errors(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Copies every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            unknown_methods: self.unknown_methods.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}
