//! The event hub: fan-out of domain events to open event streams.
//!
//! [`EventHub`] holds the live subscription set and the tracer registry.
//! Producers call [`EventHub::dispatch`] from whatever thread they run on;
//! it never blocks and never fails from their point of view. Transports
//! call [`EventHub::subscribe`] and hold the returned
//! [`SubscriptionHandle`] for the lifetime of the stream.

pub mod codec;
pub mod subscription;
pub mod tracer;

use std::sync::{Arc, Weak};

use dashmap::DashMap;

pub use codec::{EventKind, WireMessage};
pub use subscription::{Subscription, SubscriptionHandle, SubscriptionId};
pub use tracer::{
    BindingId, CoapMessageListener, CoapMessageTracer, ProtocolTracer, TracerRegistry,
};

use crate::domain::{DomainEvent, Endpoint};
use crate::error::HubError;
use crate::listeners::ProtocolTraceAdapter;

/// Default per-subscription queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
struct HubInner {
    subscriptions: DashMap<SubscriptionId, Arc<Subscription>>,
    tracers: TracerRegistry,
    queue_capacity: usize,
}

/// Central fan-out point between producers and event streams.
///
/// Cheap to clone; all clones share the same subscription set.
///
/// # Concurrency
///
/// - `dispatch` may run concurrently from any number of producer threads.
/// - `subscribe`/`unsubscribe` may race with `dispatch` and each other.
/// - Messages to one subscription keep dispatch order; there is no
///   ordering across subscriptions or endpoints.
#[derive(Debug, Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

/// Non-owning reference to an [`EventHub`], held by trace listeners the
/// protocol layer keeps alive.
#[derive(Debug, Clone)]
pub struct WeakEventHub {
    inner: Weak<HubInner>,
}

impl WeakEventHub {
    /// Returns the hub if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventHub> {
        self.inner.upgrade().map(|inner| EventHub { inner })
    }
}

impl EventHub {
    /// Creates a hub binding trace listeners through `protocol`, with
    /// per-subscription queues of `queue_capacity` messages.
    #[must_use]
    pub fn new(protocol: Arc<dyn ProtocolTracer>, queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscriptions: DashMap::new(),
                tracers: TracerRegistry::new(protocol),
                queue_capacity,
            }),
        }
    }

    /// Returns a weak reference to this hub.
    #[must_use]
    pub fn downgrade(&self) -> WeakEventHub {
        WeakEventHub {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Opens a subscription. With a `filter`, only that endpoint's events
    /// are delivered and a CoAP tracer is bound to it.
    #[must_use]
    pub fn subscribe(&self, filter: Option<Endpoint>) -> SubscriptionHandle {
        let (subscription, receiver) = Subscription::open(filter, self.inner.queue_capacity);
        let handle = SubscriptionHandle::new(&subscription, receiver, self.clone());
        self.inner
            .subscriptions
            .insert(subscription.id(), Arc::clone(&subscription));

        if let Some(endpoint) = subscription.filter() {
            let hub = self.downgrade();
            self.inner
                .tracers
                .ensure_attached(endpoint, |binding| -> Arc<dyn CoapMessageListener> {
                    Arc::new(ProtocolTraceAdapter::new(endpoint.clone(), binding, hub))
                });
        }

        tracing::info!(
            subscription = %subscription.id(),
            endpoint = ?subscription.filter().map(Endpoint::as_str),
            "event stream opened"
        );
        handle
    }

    /// Closes and removes a subscription, releasing its endpoint's tracer
    /// if nothing else needs it.
    ///
    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some((_, subscription)) = self.inner.subscriptions.remove(&id) else {
            return false;
        };
        subscription.close();

        if let Some(endpoint) = subscription.filter() {
            self.inner
                .tracers
                .release_if_unused(endpoint, |ep| self.has_filtered_subscription(ep));
        }

        tracing::info!(subscription = %id, "event stream closed");
        true
    }

    /// Encodes `event` and offers it to every matching subscription.
    ///
    /// Subscriptions whose send fails are closed; other subscriptions and
    /// the caller are unaffected.
    pub fn dispatch(&self, event: DomainEvent) {
        let targets: Vec<Arc<Subscription>> = self
            .inner
            .subscriptions
            .iter()
            .filter(|entry| entry.value().accepts(&event))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        if targets.is_empty() {
            return;
        }

        let message = match codec::encode(&event) {
            Ok(message) => Arc::new(message),
            Err(err) => {
                tracing::warn!(
                    endpoint = %event.endpoint(),
                    error = %err,
                    "dropping event that cannot be encoded"
                );
                return;
            }
        };

        tracing::debug!(
            kind = %message.kind,
            endpoint = %event.endpoint(),
            subscribers = targets.len(),
            "dispatching event"
        );

        for subscription in targets {
            let Err(err) = subscription.send(Arc::clone(&message)) else {
                continue;
            };
            if matches!(err, HubError::SubscriberLagging(_)) {
                tracing::warn!(subscription = %subscription.id(), "closing lagging event stream");
            } else {
                tracing::debug!(subscription = %subscription.id(), error = %err, "event delivery failed");
            }
            self.unsubscribe(subscription.id());
        }
    }

    /// Returns `true` if a tracer is currently bound to `endpoint`.
    #[must_use]
    pub fn is_tracing(&self, endpoint: &Endpoint) -> bool {
        self.inner.tracers.is_attached(endpoint)
    }

    /// Returns the id of the tracer binding currently held for `endpoint`.
    #[must_use]
    pub fn tracer_binding(&self, endpoint: &Endpoint) -> Option<BindingId> {
        self.inner.tracers.current(endpoint)
    }

    /// Returns the number of open subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.len()
    }

    /// Returns the number of endpoints with a bound tracer.
    #[must_use]
    pub fn traced_endpoint_count(&self) -> usize {
        self.inner.tracers.len()
    }

    fn has_filtered_subscription(&self, endpoint: &Endpoint) -> bool {
        self.inner
            .subscriptions
            .iter()
            .any(|entry| entry.value().filter() == Some(endpoint))
    }
}
