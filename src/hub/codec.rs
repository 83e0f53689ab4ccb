//! Event envelope codec: [`DomainEvent`] to [`WireMessage`].
//!
//! Each variant maps to a fixed kind label and a JSON payload the web
//! front-end understands. Encoding happens once per dispatch; the resulting
//! message is shared by every subscription that receives it.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{DomainEvent, NotificationContent, Registration, RegistrationUpdate};
use crate::error::HubError;

/// Kind label of a wire message (the SSE `event:` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Client registered.
    Registration,
    /// Registration updated.
    Updated,
    /// Client deregistered.
    Deregistration,
    /// Queue-mode client awake.
    Awake,
    /// Queue-mode client sleeping.
    Sleeping,
    /// Observe notification.
    Notification,
    /// Send request data.
    Send,
    /// Traced CoAP message.
    CoapLog,
}

impl EventKind {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Registration => "REGISTRATION",
            Self::Updated => "UPDATED",
            Self::Deregistration => "DEREGISTRATION",
            Self::Awake => "AWAKE",
            Self::Sleeping => "SLEEPING",
            Self::Notification => "NOTIFICATION",
            Self::Send => "SEND",
            Self::CoapLog => "COAPLOG",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded event, ready to be framed on any number of streams.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    /// Kind label.
    pub kind: EventKind,
    /// Structural JSON payload.
    pub payload: Value,
    /// `payload` rendered once as compact JSON.
    pub data: String,
}

#[derive(Serialize)]
struct RegUpdate<'a> {
    registration: &'a Registration,
    update: &'a RegistrationUpdate,
}

/// Encodes a domain event into its wire message.
///
/// # Errors
///
/// Returns [`HubError::Encoding`] if any part of the event has no JSON
/// representation (e.g. a non-finite float resource value).
pub fn encode(event: &DomainEvent) -> Result<WireMessage, HubError> {
    let (kind, payload) = match event {
        DomainEvent::Registered { registration } => {
            (EventKind::Registration, serde_json::to_value(registration)?)
        }
        DomainEvent::Updated {
            registration,
            update,
        } => (
            EventKind::Updated,
            serde_json::to_value(RegUpdate {
                registration,
                update,
            })?,
        ),
        DomainEvent::Deregistered { registration } => {
            (EventKind::Deregistration, serde_json::to_value(registration)?)
        }
        DomainEvent::Awake { endpoint } => (EventKind::Awake, serde_json::json!({ "ep": endpoint })),
        DomainEvent::Sleeping { endpoint } => {
            (EventKind::Sleeping, serde_json::json!({ "ep": endpoint }))
        }
        DomainEvent::Notification { endpoint, content } => {
            let payload = match content {
                NotificationContent::Single { path, value } => serde_json::json!({
                    "ep": endpoint,
                    "kind": "single",
                    "res": path,
                    "val": serde_json::to_value(value)?,
                }),
                NotificationContent::Composite { paths, values } => serde_json::json!({
                    "ep": endpoint,
                    "kind": "composite",
                    "val": serde_json::to_value(values)?,
                    "paths": paths,
                }),
            };
            (EventKind::Notification, payload)
        }
        DomainEvent::SendData { endpoint, nodes } => (
            EventKind::Send,
            serde_json::json!({
                "ep": endpoint,
                "val": serde_json::to_value(nodes)?,
            }),
        ),
        DomainEvent::ProtocolTrace { endpoint, message } => {
            let mut fields = match serde_json::to_value(message)? {
                Value::Object(fields) => fields,
                other => {
                    let mut fields = Map::new();
                    fields.insert("message".to_string(), other);
                    fields
                }
            };
            fields.insert("ep".to_string(), Value::String(endpoint.to_string()));
            (EventKind::CoapLog, Value::Object(fields))
        }
    };

    let data = serde_json::to_string(&payload)?;
    Ok(WireMessage {
        kind,
        payload,
        data,
    })
}
