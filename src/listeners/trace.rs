//! Per-endpoint CoAP trace adapter.

use crate::domain::{CoapMessage, DomainEvent, Endpoint};
use crate::hub::{BindingId, CoapMessageListener, WeakEventHub};

/// Trace listener bound to one endpoint by the tracer registry.
///
/// Holds the hub weakly: the protocol layer owns this listener, and a
/// listener that outlives its binding must not keep the hub alive or emit
/// anything. It emits only while `binding` is the endpoint's current
/// binding, so a listener the protocol layer failed to detach stays silent
/// after the endpoint is bound again.
#[derive(Debug, Clone)]
pub struct ProtocolTraceAdapter {
    endpoint: Endpoint,
    binding: BindingId,
    hub: WeakEventHub,
}

impl ProtocolTraceAdapter {
    /// Creates a listener emitting COAPLOG events for `endpoint` while
    /// `binding` is current.
    #[must_use]
    pub const fn new(endpoint: Endpoint, binding: BindingId, hub: WeakEventHub) -> Self {
        Self {
            endpoint,
            binding,
            hub,
        }
    }

    /// Returns the endpoint this listener is scoped to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl CoapMessageListener for ProtocolTraceAdapter {
    fn trace(&self, message: &CoapMessage) {
        let Some(hub) = self.hub.upgrade() else {
            return;
        };
        if hub.tracer_binding(&self.endpoint) != Some(self.binding) {
            tracing::trace!(
                endpoint = %self.endpoint,
                binding = self.binding,
                "dropping trace from released binding"
            );
            return;
        }
        hub.dispatch(DomainEvent::ProtocolTrace {
            endpoint: self.endpoint.clone(),
            message: message.clone(),
        });
    }
}
