//! Domain layer: the device-management data model and its events.
//!
//! These are the types the registration, observation, presence, send and
//! protocol-trace producers hand to the listener adapters, plus the closed
//! [`DomainEvent`] enum the hub dispatches.

pub mod coap_message;
pub mod endpoint;
pub mod event;
pub mod node;
pub mod observation;
pub mod path;
pub mod registration;

pub use coap_message::{CoapMessage, CoapType};
pub use endpoint::Endpoint;
pub use event::{DomainEvent, NotificationContent};
pub use node::{LwM2mNode, Resource, ResourceValue};
pub use observation::{CompositeObservation, Observation, SingleObservation};
pub use path::LwM2mPath;
pub use registration::{Registration, RegistrationUpdate};
