//! Observe notification adapter.

use std::collections::BTreeMap;
use std::error::Error;

use crate::domain::{
    CompositeObservation, DomainEvent, LwM2mNode, LwM2mPath, NotificationContent, Observation,
    Registration, SingleObservation,
};
use crate::hub::EventHub;

/// Callbacks of the observation engine.
pub trait ObservationListener: Send + Sync {
    /// A new observation was established.
    fn new_observation(&self, _observation: &Observation, _registration: &Registration) {}

    /// An observation was cancelled.
    fn cancelled(&self, _observation: &Observation) {}

    /// A notification arrived for a single-path observation. `registration`
    /// is `None` when the client is no longer registered.
    fn on_single_response(
        &self,
        observation: &SingleObservation,
        registration: Option<&Registration>,
        content: &LwM2mNode,
    );

    /// A notification arrived for a composite observation.
    fn on_composite_response(
        &self,
        observation: &CompositeObservation,
        registration: Option<&Registration>,
        content: &BTreeMap<LwM2mPath, Option<LwM2mNode>>,
    );

    /// A notification could not be handled.
    fn on_error(
        &self,
        observation: &Observation,
        registration: Option<&Registration>,
        error: &(dyn Error + Send + Sync),
    );
}

/// Emits NOTIFICATION events; errors are only logged.
#[derive(Debug, Clone)]
pub struct ObservationEventAdapter {
    hub: EventHub,
}

impl ObservationEventAdapter {
    /// Creates an adapter feeding `hub`.
    #[must_use]
    pub const fn new(hub: EventHub) -> Self {
        Self { hub }
    }
}

impl ObservationListener for ObservationEventAdapter {
    fn on_single_response(
        &self,
        observation: &SingleObservation,
        registration: Option<&Registration>,
        content: &LwM2mNode,
    ) {
        tracing::debug!(path = %observation.path, "received notification");
        let Some(registration) = registration else {
            return;
        };
        self.hub.dispatch(DomainEvent::Notification {
            endpoint: registration.endpoint.clone(),
            content: NotificationContent::Single {
                path: observation.path,
                value: content.clone(),
            },
        });
    }

    fn on_composite_response(
        &self,
        observation: &CompositeObservation,
        registration: Option<&Registration>,
        content: &BTreeMap<LwM2mPath, Option<LwM2mNode>>,
    ) {
        tracing::debug!(paths = observation.paths.len(), "received composite notification");
        let Some(registration) = registration else {
            return;
        };
        self.hub.dispatch(DomainEvent::Notification {
            endpoint: registration.endpoint.clone(),
            content: NotificationContent::Composite {
                paths: observation.paths.clone(),
                values: content.clone(),
            },
        });
    }

    fn on_error(
        &self,
        observation: &Observation,
        _registration: Option<&Registration>,
        error: &(dyn Error + Send + Sync),
    ) {
        tracing::warn!(
            registration_id = observation.registration_id(),
            paths = %observation.paths(),
            error = %error,
            "unable to handle notification"
        );
    }
}
