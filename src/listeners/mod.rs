//! Domain listener adapters: producer callbacks in, hub dispatches out.
//!
//! Each producer of the device-management server (registrations,
//! observations, presence, Send requests, CoAP tracing) exposes its own
//! listener trait. The adapters here implement those traits, turn each
//! callback into a [`crate::domain::DomainEvent`] and hand it to the hub.
//! They keep no state, retry nothing and buffer nothing.

pub mod observation;
pub mod presence;
pub mod registration;
pub mod send;
pub mod trace;

use std::sync::Arc;

pub use observation::{ObservationEventAdapter, ObservationListener};
pub use presence::{PresenceEventAdapter, PresenceListener};
pub use registration::{RegistrationEventAdapter, RegistrationListener};
pub use send::{SendEventAdapter, SendListener};
pub use trace::ProtocolTraceAdapter;

use crate::hub::EventHub;

/// An event source that accepts listeners of type `L`.
pub trait ListenerRegistry<L: ?Sized> {
    /// Registers `listener` for all future callbacks.
    fn add_listener(&self, listener: Arc<L>);
}

/// Registers one adapter per producer, all feeding `hub`.
pub fn install(
    hub: &EventHub,
    registrations: &dyn ListenerRegistry<dyn RegistrationListener>,
    observations: &dyn ListenerRegistry<dyn ObservationListener>,
    presence: &dyn ListenerRegistry<dyn PresenceListener>,
    sends: &dyn ListenerRegistry<dyn SendListener>,
) {
    registrations.add_listener(Arc::new(RegistrationEventAdapter::new(hub.clone())));
    observations.add_listener(Arc::new(ObservationEventAdapter::new(hub.clone())));
    presence.add_listener(Arc::new(PresenceEventAdapter::new(hub.clone())));
    sends.add_listener(Arc::new(SendEventAdapter::new(hub.clone())));
    tracing::info!("event hub listeners installed");
}
