//! Registration lifecycle adapter.

use crate::domain::{DomainEvent, Observation, Registration, RegistrationUpdate};
use crate::hub::EventHub;

/// Callbacks of the registration engine.
///
/// May be invoked concurrently from different threads for different
/// endpoints.
pub trait RegistrationListener: Send + Sync {
    /// A client registered, possibly replacing a previous registration whose
    /// observations were dropped.
    fn registered(
        &self,
        registration: &Registration,
        previous: Option<&Registration>,
        previous_observations: &[Observation],
    );

    /// A client updated its registration.
    fn updated(
        &self,
        update: &RegistrationUpdate,
        updated: &Registration,
        previous: &Registration,
    );

    /// A registration was removed, by deregistration or expiry.
    fn unregistered(
        &self,
        registration: &Registration,
        observations: &[Observation],
        expired: bool,
        new_registration: Option<&Registration>,
    );
}

/// Emits REGISTRATION / UPDATED / DEREGISTRATION events.
#[derive(Debug, Clone)]
pub struct RegistrationEventAdapter {
    hub: EventHub,
}

impl RegistrationEventAdapter {
    /// Creates an adapter feeding `hub`.
    #[must_use]
    pub const fn new(hub: EventHub) -> Self {
        Self { hub }
    }
}

impl RegistrationListener for RegistrationEventAdapter {
    fn registered(
        &self,
        registration: &Registration,
        _previous: Option<&Registration>,
        _previous_observations: &[Observation],
    ) {
        self.hub.dispatch(DomainEvent::Registered {
            registration: registration.clone(),
        });
    }

    fn updated(
        &self,
        update: &RegistrationUpdate,
        updated: &Registration,
        _previous: &Registration,
    ) {
        self.hub.dispatch(DomainEvent::Updated {
            registration: updated.clone(),
            update: update.clone(),
        });
    }

    fn unregistered(
        &self,
        registration: &Registration,
        _observations: &[Observation],
        expired: bool,
        _new_registration: Option<&Registration>,
    ) {
        tracing::debug!(endpoint = %registration.endpoint, expired, "registration removed");
        self.hub.dispatch(DomainEvent::Deregistered {
            registration: registration.clone(),
        });
    }
}
