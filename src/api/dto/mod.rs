//! Request and response types for the HTTP endpoints.

pub mod event_dto;

pub use event_dto::EventStreamParams;
