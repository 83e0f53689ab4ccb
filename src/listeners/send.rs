//! LwM2M Send request adapter.

use std::collections::BTreeMap;
use std::error::Error;

use crate::domain::{DomainEvent, LwM2mNode, LwM2mPath, Registration};
use crate::hub::EventHub;

/// Callbacks of the Send service.
pub trait SendListener: Send + Sync {
    /// A client pushed data. `registration` is `None` when the sender is
    /// not registered.
    fn data_received(
        &self,
        registration: Option<&Registration>,
        nodes: &BTreeMap<LwM2mPath, LwM2mNode>,
    );

    /// A Send request could not be handled.
    fn on_error(&self, registration: Option<&Registration>, error: &(dyn Error + Send + Sync));
}

/// Emits SEND events with the full decoded node collection.
#[derive(Debug, Clone)]
pub struct SendEventAdapter {
    hub: EventHub,
}

impl SendEventAdapter {
    /// Creates an adapter feeding `hub`.
    #[must_use]
    pub const fn new(hub: EventHub) -> Self {
        Self { hub }
    }
}

impl SendListener for SendEventAdapter {
    fn data_received(
        &self,
        registration: Option<&Registration>,
        nodes: &BTreeMap<LwM2mPath, LwM2mNode>,
    ) {
        let Some(registration) = registration else {
            tracing::debug!(nodes = nodes.len(), "ignoring Send from unregistered client");
            return;
        };
        tracing::debug!(endpoint = %registration.endpoint, nodes = nodes.len(), "received Send request");
        self.hub.dispatch(DomainEvent::SendData {
            endpoint: registration.endpoint.clone(),
            nodes: nodes.clone(),
        });
    }

    fn on_error(&self, registration: Option<&Registration>, error: &(dyn Error + Send + Sync)) {
        tracing::warn!(
            endpoint = ?registration.map(|r| r.endpoint.as_str()),
            error = %error,
            "unable to handle Send request"
        );
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::registration::sample_registration;
    use crate::domain::ResourceValue;
    use crate::error::HubError;
    use crate::hub::EventKind;
    use crate::listeners::testing::hub;

    fn nodes() -> BTreeMap<LwM2mPath, LwM2mNode> {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            LwM2mPath::resource(3, 0, 1),
            LwM2mNode::SingleResource {
                id: 1,
                value: ResourceValue::String("x".to_string()),
            },
        );
        nodes
    }

    #[test]
    fn data_is_forwarded_to_wildcard_and_filtered() {
        let hub = hub();
        let adapter = SendEventAdapter::new(hub.clone());
        let mut all = hub.subscribe(None);
        let mut dev1 = hub.subscribe(Some("dev1".into()));

        adapter.data_received(Some(&sample_registration("dev1")), &nodes());

        let (Some(a), Some(b)) = (all.try_recv(), dev1.try_recv()) else {
            panic!("both streams should get one SEND frame");
        };
        assert_eq!(a.kind, EventKind::Send);
        assert_eq!(a.payload, b.payload);
        assert_eq!(a.payload["val"]["/3/0/1"]["value"], "x");
        assert!(all.try_recv().is_none());
        assert!(dev1.try_recv().is_none());
    }

    #[test]
    fn unregistered_sender_and_errors_emit_nothing() {
        let hub = hub();
        let adapter = SendEventAdapter::new(hub.clone());
        let mut all = hub.subscribe(None);

        adapter.data_received(None, &nodes());
        let error = HubError::SubscriptionClosed(uuid::Uuid::nil());
        adapter.on_error(Some(&sample_registration("dev1")), &error);
        assert!(all.try_recv().is_none());
    }
}
