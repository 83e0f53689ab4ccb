//! Domain events fanned out to stream subscribers.
//!
//! Every producer callback is translated into one [`DomainEvent`] and handed
//! to [`crate::hub::EventHub::dispatch`]. Events are immutable and consumed
//! exactly once; the hub keeps no history.

use std::collections::BTreeMap;

use super::{CoapMessage, Endpoint, LwM2mNode, LwM2mPath, Registration, RegistrationUpdate};

/// Content of an observe notification.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationContent {
    /// Notification for a single observed path.
    Single {
        /// Observed path.
        path: LwM2mPath,
        /// Decoded value.
        value: LwM2mNode,
    },
    /// Observe-Composite notification.
    Composite {
        /// Observed paths, in observation order.
        paths: Vec<LwM2mPath>,
        /// Decoded values per path; `None` when the client reported none.
        values: BTreeMap<LwM2mPath, Option<LwM2mNode>>,
    },
}

/// Event produced by one of the device-management listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A client registered.
    Registered {
        /// New registration.
        registration: Registration,
    },
    /// A client updated its registration.
    Updated {
        /// Registration after the update.
        registration: Registration,
        /// The update delta.
        update: RegistrationUpdate,
    },
    /// A client deregistered or its registration expired.
    Deregistered {
        /// Removed registration.
        registration: Registration,
    },
    /// A queue-mode client woke up.
    Awake {
        /// Client endpoint.
        endpoint: Endpoint,
    },
    /// A queue-mode client went to sleep.
    Sleeping {
        /// Client endpoint.
        endpoint: Endpoint,
    },
    /// An observe notification arrived.
    Notification {
        /// Client endpoint.
        endpoint: Endpoint,
        /// Notified content.
        content: NotificationContent,
    },
    /// A client pushed data with a Send request.
    SendData {
        /// Client endpoint.
        endpoint: Endpoint,
        /// All decoded nodes, keyed by path.
        nodes: BTreeMap<LwM2mPath, LwM2mNode>,
    },
    /// A CoAP message exchanged with a traced endpoint.
    ProtocolTrace {
        /// Traced endpoint.
        endpoint: Endpoint,
        /// The traced message.
        message: CoapMessage,
    },
}

impl DomainEvent {
    /// Returns the endpoint the event originates from.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Registered { registration }
            | Self::Updated { registration, .. }
            | Self::Deregistered { registration } => &registration.endpoint,
            Self::Awake { endpoint }
            | Self::Sleeping { endpoint }
            | Self::Notification { endpoint, .. }
            | Self::SendData { endpoint, .. }
            | Self::ProtocolTrace { endpoint, .. } => endpoint,
        }
    }

    /// Returns `true` for protocol trace events, which only reach
    /// subscriptions filtering on the traced endpoint.
    #[must_use]
    pub const fn is_protocol_trace(&self) -> bool {
        matches!(self, Self::ProtocolTrace { .. })
    }
}
