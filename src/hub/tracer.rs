//! Tracer registry: endpoint-scoped CoAP message tracing.
//!
//! Tracing every CoAP message is expensive, so a trace listener is bound to
//! an endpoint only while some stream subscription filters on it. The hub
//! drives [`TracerRegistry::ensure_attached`] on subscribe and
//! [`TracerRegistry::release_if_unused`] on unsubscribe; the protocol layer
//! is reached through [`ProtocolTracer`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::domain::{CoapMessage, Endpoint};
use crate::error::HubError;

/// Callback invoked by the protocol layer for every traced message of one
/// endpoint.
pub trait CoapMessageListener: Send + Sync {
    /// Handles one traced message.
    fn trace(&self, message: &CoapMessage);
}

/// Protocol layer operations needed to bind and unbind trace listeners.
pub trait ProtocolTracer: Send + Sync {
    /// Starts routing `endpoint`'s messages to `listener`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Tracer`] if the protocol layer refuses.
    fn add_listener(
        &self,
        endpoint: &Endpoint,
        listener: Arc<dyn CoapMessageListener>,
    ) -> Result<(), HubError>;

    /// Stops routing `endpoint`'s messages.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Tracer`] if the protocol layer refuses.
    fn remove_listener(&self, endpoint: &Endpoint) -> Result<(), HubError>;
}

/// In-process CoAP interceptor sink.
///
/// The CoAP stack calls [`CoapMessageTracer::trace`] for every message it
/// sends or receives; messages of endpoints without a bound listener are
/// ignored.
#[derive(Default)]
pub struct CoapMessageTracer {
    listeners: DashMap<Endpoint, Arc<dyn CoapMessageListener>>,
}

impl CoapMessageTracer {
    /// Creates a tracer with no bound listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one intercepted message to the listener bound to `endpoint`.
    pub fn trace(&self, endpoint: &Endpoint, message: &CoapMessage) {
        // Clone out of the map so the listener runs without a shard lock held.
        let listener = self
            .listeners
            .get(endpoint)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(listener) = listener {
            listener.trace(message);
        }
    }

    /// Returns `true` if a listener is bound to `endpoint`.
    #[must_use]
    pub fn is_tracing(&self, endpoint: &Endpoint) -> bool {
        self.listeners.contains_key(endpoint)
    }
}

impl fmt::Debug for CoapMessageTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoapMessageTracer")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ProtocolTracer for CoapMessageTracer {
    fn add_listener(
        &self,
        endpoint: &Endpoint,
        listener: Arc<dyn CoapMessageListener>,
    ) -> Result<(), HubError> {
        self.listeners.insert(endpoint.clone(), listener);
        Ok(())
    }

    fn remove_listener(&self, endpoint: &Endpoint) -> Result<(), HubError> {
        self.listeners.remove(endpoint);
        Ok(())
    }
}

/// Identity of one tracer binding. Every attach gets a fresh id, so a
/// listener from an earlier binding of the same endpoint can tell that it
/// is no longer the bound one.
pub type BindingId = u64;

#[derive(Debug, Default)]
struct Bindings {
    next_id: BindingId,
    by_endpoint: HashMap<Endpoint, BindingId>,
}

/// Tracks which endpoints currently have a trace listener bound.
///
/// Attach and release run under one lock, so a concurrent subscribe and
/// unsubscribe on the same endpoint always leave the binding consistent with
/// the live subscription set.
pub struct TracerRegistry {
    protocol: Arc<dyn ProtocolTracer>,
    bindings: Mutex<Bindings>,
}

impl TracerRegistry {
    /// Creates a registry binding listeners through `protocol`.
    #[must_use]
    pub fn new(protocol: Arc<dyn ProtocolTracer>) -> Self {
        Self {
            protocol,
            bindings: Mutex::new(Bindings::default()),
        }
    }

    /// Binds a listener for `endpoint` unless one is already bound.
    ///
    /// `listener` is only invoked when a binding is actually created, and
    /// receives the id of that binding.
    /// Attach failures are logged; tracing is best-effort.
    pub fn ensure_attached<F>(&self, endpoint: &Endpoint, listener: F)
    where
        F: FnOnce(BindingId) -> Arc<dyn CoapMessageListener>,
    {
        let mut bindings = self.bindings.lock().unwrap_or_else(PoisonError::into_inner);
        if bindings.by_endpoint.contains_key(endpoint) {
            return;
        }
        let id = bindings.next_id;
        bindings.next_id = bindings.next_id.wrapping_add(1);
        match self.protocol.add_listener(endpoint, listener(id)) {
            Ok(()) => {
                bindings.by_endpoint.insert(endpoint.clone(), id);
                tracing::debug!(%endpoint, binding = id, "coap tracer attached");
            }
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "failed to attach coap tracer");
            }
        }
    }

    /// Unbinds `endpoint`'s listener unless `in_use` reports that an open
    /// subscription still filters on it.
    ///
    /// The binding is forgotten even if the protocol layer fails to detach;
    /// a listener left behind no longer matches [`Self::current`] and stays
    /// silent.
    pub fn release_if_unused<F>(&self, endpoint: &Endpoint, in_use: F)
    where
        F: FnOnce(&Endpoint) -> bool,
    {
        let mut bindings = self.bindings.lock().unwrap_or_else(PoisonError::into_inner);
        if in_use(endpoint) || bindings.by_endpoint.remove(endpoint).is_none() {
            return;
        }
        match self.protocol.remove_listener(endpoint) {
            Ok(()) => tracing::debug!(%endpoint, "coap tracer detached"),
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "failed to detach coap tracer");
            }
        }
    }

    /// Returns `true` if a binding exists for `endpoint`.
    #[must_use]
    pub fn is_attached(&self, endpoint: &Endpoint) -> bool {
        self.current(endpoint).is_some()
    }

    /// Returns the id of `endpoint`'s current binding, if any.
    #[must_use]
    pub fn current(&self, endpoint: &Endpoint) -> Option<BindingId> {
        self.bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_endpoint
            .get(endpoint)
            .copied()
    }

    /// Returns the number of bound endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_endpoint
            .len()
    }

    /// Returns `true` if no endpoint is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TracerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerRegistry")
            .field("bindings", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::coap_message::sample_message;

    #[derive(Default)]
    struct Counting {
        traced: AtomicUsize,
    }

    impl CoapMessageListener for Counting {
        fn trace(&self, _message: &CoapMessage) {
            self.traced.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Protocol layer that counts calls and can be told to fail.
    #[derive(Default)]
    struct Recording {
        inner: CoapMessageTracer,
        adds: AtomicUsize,
        removes: AtomicUsize,
        refuse: bool,
    }

    impl ProtocolTracer for Recording {
        fn add_listener(
            &self,
            endpoint: &Endpoint,
            listener: Arc<dyn CoapMessageListener>,
        ) -> Result<(), HubError> {
            if self.refuse {
                return Err(HubError::Tracer {
                    endpoint: endpoint.to_string(),
                    reason: "interceptor unavailable".to_string(),
                });
            }
            self.adds.fetch_add(1, Ordering::SeqCst);
            self.inner.add_listener(endpoint, listener)
        }

        fn remove_listener(&self, endpoint: &Endpoint) -> Result<(), HubError> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            self.inner.remove_listener(endpoint)
        }
    }

    fn counting(_binding: BindingId) -> Arc<dyn CoapMessageListener> {
        Arc::new(Counting::default())
    }

    #[test]
    fn tracer_routes_only_bound_endpoints() {
        let tracer = CoapMessageTracer::new();
        let listener = Arc::new(Counting::default());
        let dev1 = Endpoint::from("dev1");
        let bound: Arc<dyn CoapMessageListener> = Arc::clone(&listener) as _;
        assert!(tracer.add_listener(&dev1, bound).is_ok());

        tracer.trace(&dev1, &sample_message(true));
        tracer.trace(&Endpoint::from("dev2"), &sample_message(true));
        assert_eq!(listener.traced.load(Ordering::SeqCst), 1);

        assert!(tracer.remove_listener(&dev1).is_ok());
        tracer.trace(&dev1, &sample_message(false));
        assert_eq!(listener.traced.load(Ordering::SeqCst), 1);
        assert!(!tracer.is_tracing(&dev1));
    }

    #[test]
    fn ensure_attached_binds_once() {
        let protocol = Arc::new(Recording::default());
        let registry = TracerRegistry::new(Arc::clone(&protocol) as Arc<dyn ProtocolTracer>);
        let dev1 = Endpoint::from("dev1");

        registry.ensure_attached(&dev1, counting);
        registry.ensure_attached(&dev1, |_| panic!("listener built for an existing binding"));

        assert_eq!(protocol.adds.load(Ordering::SeqCst), 1);
        assert!(registry.is_attached(&dev1));
        assert!(protocol.inner.is_tracing(&dev1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_keeps_binding_while_in_use() {
        let protocol = Arc::new(Recording::default());
        let registry = TracerRegistry::new(Arc::clone(&protocol) as Arc<dyn ProtocolTracer>);
        let dev1 = Endpoint::from("dev1");
        registry.ensure_attached(&dev1, counting);

        registry.release_if_unused(&dev1, |_| true);
        assert!(registry.is_attached(&dev1));

        registry.release_if_unused(&dev1, |_| false);
        assert!(!registry.is_attached(&dev1));
        assert!(registry.is_empty());
        assert_eq!(protocol.removes.load(Ordering::SeqCst), 1);

        // Releasing an unbound endpoint does not touch the protocol layer.
        registry.release_if_unused(&dev1, |_| false);
        assert_eq!(protocol.removes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reattach_gets_a_new_binding_id() {
        let protocol = Arc::new(Recording::default());
        let registry = TracerRegistry::new(Arc::clone(&protocol) as Arc<dyn ProtocolTracer>);
        let dev1 = Endpoint::from("dev1");

        registry.ensure_attached(&dev1, counting);
        let Some(first) = registry.current(&dev1) else {
            panic!("expected a binding");
        };
        registry.release_if_unused(&dev1, |_| false);
        assert_eq!(registry.current(&dev1), None);

        registry.ensure_attached(&dev1, counting);
        let Some(second) = registry.current(&dev1) else {
            panic!("expected a binding");
        };
        assert_ne!(first, second);
    }

    #[test]
    fn attach_failure_leaves_no_binding() {
        let protocol = Arc::new(Recording {
            refuse: true,
            ..Recording::default()
        });
        let registry = TracerRegistry::new(protocol as Arc<dyn ProtocolTracer>);
        let dev1 = Endpoint::from("dev1");
        registry.ensure_attached(&dev1, counting);
        assert!(!registry.is_attached(&dev1));
    }

    #[test]
    fn concurrent_attach_binds_once() {
        let protocol = Arc::new(Recording::default());
        let registry = Arc::new(TracerRegistry::new(
            Arc::clone(&protocol) as Arc<dyn ProtocolTracer>
        ));
        let dev1 = Endpoint::from("dev1");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let dev1 = dev1.clone();
                std::thread::spawn(move || registry.ensure_attached(&dev1, counting))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
        assert_eq!(protocol.adds.load(Ordering::SeqCst), 1);
    }
}
