//! Traced CoAP messages, as reported by the protocol layer interceptor.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// CoAP message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoapType {
    /// Confirmable.
    Con,
    /// Non-confirmable.
    Non,
    /// Acknowledgement.
    Ack,
    /// Reset.
    Rst,
}

/// A snapshot of one CoAP message seen on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoapMessage {
    /// `true` when received from the client, `false` when sent to it.
    pub incoming: bool,
    /// When the message was intercepted.
    pub timestamp: DateTime<Utc>,
    /// Message type.
    #[serde(rename = "type")]
    pub message_type: CoapType,
    /// Request method or response code (e.g. `"GET"`, `"2.05"`).
    pub code: String,
    /// CoAP message id.
    #[serde(rename = "mId")]
    pub message_id: u16,
    /// Token, hex-encoded.
    pub token: String,
    /// Rendered options (e.g. `"Uri-Path: \"rd\""`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    /// Payload rendered as text, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_message(incoming: bool) -> CoapMessage {
    CoapMessage {
        incoming,
        timestamp: Utc::now(),
        message_type: CoapType::Con,
        code: "POST".to_string(),
        message_id: 4242,
        token: "a1b2".to_string(),
        options: Some("Uri-Path: \"rd\"".to_string()),
        payload: None,
    }
}
