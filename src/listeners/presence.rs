//! Queue-mode presence adapter.

use crate::domain::{DomainEvent, Registration};
use crate::hub::EventHub;

/// Callbacks of the presence service for queue-mode clients.
pub trait PresenceListener: Send + Sync {
    /// The client went to sleep.
    fn on_sleeping(&self, registration: &Registration);

    /// The client woke up.
    fn on_awake(&self, registration: &Registration);
}

/// Emits SLEEPING / AWAKE events carrying only the endpoint.
#[derive(Debug, Clone)]
pub struct PresenceEventAdapter {
    hub: EventHub,
}

impl PresenceEventAdapter {
    /// Creates an adapter feeding `hub`.
    #[must_use]
    pub const fn new(hub: EventHub) -> Self {
        Self { hub }
    }
}

impl PresenceListener for PresenceEventAdapter {
    fn on_sleeping(&self, registration: &Registration) {
        self.hub.dispatch(DomainEvent::Sleeping {
            endpoint: registration.endpoint.clone(),
        });
    }

    fn on_awake(&self, registration: &Registration) {
        self.hub.dispatch(DomainEvent::Awake {
            endpoint: registration.endpoint.clone(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::registration::sample_registration;
    use crate::hub::EventKind;
    use crate::listeners::testing::hub;

    #[test]
    fn presence_transitions_emit_endpoint_only() {
        let hub = hub();
        let adapter = PresenceEventAdapter::new(hub.clone());
        let mut stream = hub.subscribe(Some("dev4".into()));

        let registration = sample_registration("dev4");
        adapter.on_sleeping(&registration);
        adapter.on_awake(&registration);

        let (Some(sleeping), Some(awake)) = (stream.try_recv(), stream.try_recv()) else {
            panic!("expected two presence frames");
        };
        assert_eq!(sleeping.kind, EventKind::Sleeping);
        assert_eq!(sleeping.data, r#"{"ep":"dev4"}"#);
        assert_eq!(awake.kind, EventKind::Awake);
        assert_eq!(awake.data, r#"{"ep":"dev4"}"#);
    }
}
