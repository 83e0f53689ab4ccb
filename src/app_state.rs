//! Shared application state injected into all Axum handlers.

use std::time::Duration;

use crate::hub::EventHub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event hub backing the event streams.
    pub hub: EventHub,
    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}
