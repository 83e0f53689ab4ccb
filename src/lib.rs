//! # lwm2m-event-gateway
//!
//! Streams the events of a LwM2M device-management server to web observers
//! over Server-Sent Events.
//!
//! Registration lifecycle, presence transitions, observe notifications,
//! Send requests and per-endpoint CoAP message traces are turned into
//! typed domain events, encoded once, filtered per subscriber and queued
//! on every matching open stream.
//!
//! ## Architecture
//!
//! ```text
//! Producers (registration, observation, presence, send, CoAP stack)
//!     │
//!     ├── Listener adapters (listeners/)
//!     │
//!     ├── EventHub (hub/)
//!     │     ├── codec: DomainEvent → WireMessage
//!     │     ├── live subscription set (per-stream queues)
//!     │     └── TracerRegistry ── CoapMessageTracer
//!     │
//!     └── SSE handler (api/) → web clients
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod listeners;
