// src/core/state/mod.rs

//! Shared server state.

mod stats;

pub use stats::{StatsSnapshot, StatsState};
