//! One open event stream and the handle its transport holds.
//!
//! A [`Subscription`] lives in the hub's live set. It owns the sending half
//! of a bounded per-subscription queue; the transport drains the receiving
//! half through a [`SubscriptionHandle`]. Sends never block: a full queue
//! means the consumer is not keeping up and counts as a delivery failure.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use super::EventHub;
use super::codec::WireMessage;
use crate::domain::{DomainEvent, Endpoint};
use crate::error::HubError;

/// Identity of a subscription within the hub.
pub type SubscriptionId = Uuid;

/// Hub-side state of one streaming client.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    filter: Option<Endpoint>,
    /// `None` once closed. The lock also serializes sends to this
    /// subscription.
    sender: Mutex<Option<mpsc::Sender<Arc<WireMessage>>>>,
}

impl Subscription {
    pub(crate) fn open(
        filter: Option<Endpoint>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Arc<WireMessage>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscription = Self {
            id: Uuid::new_v4(),
            filter,
            sender: Mutex::new(Some(tx)),
        };
        (Arc::new(subscription), rx)
    }

    /// Returns the subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the endpoint filter; `None` for a wildcard subscription.
    #[must_use]
    pub fn filter(&self) -> Option<&Endpoint> {
        self.filter.as_ref()
    }

    /// Returns `true` if the event should be offered to this subscription.
    ///
    /// Wildcard subscriptions receive every event except protocol traces;
    /// filtered ones receive only events from their endpoint.
    #[must_use]
    pub fn accepts(&self, event: &DomainEvent) -> bool {
        match &self.filter {
            Some(endpoint) => endpoint == event.endpoint(),
            None => !event.is_protocol_trace(),
        }
    }

    /// Returns `true` once the subscription has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Enqueues a message for this subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::SubscriptionClosed`] if the subscription was
    /// closed or its receiver dropped, and [`HubError::SubscriberLagging`]
    /// if its queue is full.
    pub fn send(&self, message: Arc<WireMessage>) -> Result<(), HubError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(HubError::SubscriptionClosed(self.id));
        };
        sender.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => HubError::SubscriberLagging(self.id),
            TrySendError::Closed(_) => HubError::SubscriptionClosed(self.id),
        })
    }

    /// Closes the subscription. The receiving side sees end-of-stream once
    /// it has drained what was already queued. Idempotent.
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Transport-side handle to a subscription.
///
/// Dropping the handle unsubscribes, so a disconnected stream releases its
/// slot in the hub (and any tracer binding) without further bookkeeping.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    filter: Option<Endpoint>,
    receiver: mpsc::Receiver<Arc<WireMessage>>,
    hub: EventHub,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        subscription: &Subscription,
        receiver: mpsc::Receiver<Arc<WireMessage>>,
        hub: EventHub,
    ) -> Self {
        Self {
            id: subscription.id(),
            filter: subscription.filter().cloned(),
            receiver,
            hub,
        }
    }

    /// Returns the subscription id.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the endpoint filter of the subscription.
    #[must_use]
    pub fn filter(&self) -> Option<&Endpoint> {
        self.filter.as_ref()
    }

    /// Waits for the next message. Returns `None` once the subscription is
    /// closed and drained.
    pub async fn recv(&mut self) -> Option<Arc<WireMessage>> {
        self.receiver.recv().await
    }

    /// Returns the next queued message without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<WireMessage>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::hub::codec::EventKind;

    fn message() -> Arc<WireMessage> {
        Arc::new(WireMessage {
            kind: EventKind::Awake,
            payload: serde_json::json!({"ep": "dev1"}),
            data: r#"{"ep":"dev1"}"#.to_string(),
        })
    }

    fn awake(ep: &str) -> DomainEvent {
        DomainEvent::Awake {
            endpoint: Endpoint::from(ep),
        }
    }

    #[test]
    fn filtered_accepts_only_its_endpoint() {
        let (sub, _rx) = Subscription::open(Some(Endpoint::from("dev1")), 4);
        assert!(sub.accepts(&awake("dev1")));
        assert!(!sub.accepts(&awake("dev2")));
    }

    #[test]
    fn wildcard_accepts_everything_but_traces() {
        let (sub, _rx) = Subscription::open(None, 4);
        assert!(sub.accepts(&awake("dev1")));
        assert!(sub.accepts(&awake("dev2")));
        let trace = DomainEvent::ProtocolTrace {
            endpoint: Endpoint::from("dev1"),
            message: crate::domain::coap_message::sample_message(true),
        };
        assert!(!sub.accepts(&trace));
    }

    #[test]
    fn send_enqueues_in_order() {
        let (sub, mut rx) = Subscription::open(None, 4);
        assert!(sub.send(message()).is_ok());
        assert!(sub.send(message()).is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_reports_lagging() {
        let (sub, _rx) = Subscription::open(None, 1);
        assert!(sub.send(message()).is_ok());
        let Err(err) = sub.send(message()) else {
            panic!("second send should overflow");
        };
        assert!(matches!(err, HubError::SubscriberLagging(id) if id == sub.id()));
    }

    #[test]
    fn close_is_idempotent_and_rejects_sends() {
        let (sub, mut rx) = Subscription::open(None, 4);
        assert!(sub.send(message()).is_ok());
        sub.close();
        sub.close();
        assert!(sub.is_closed());
        assert!(matches!(
            sub.send(message()),
            Err(HubError::SubscriptionClosed(_))
        ));
        // Queued message is still drained, then the stream ends.
        assert!(rx.try_recv().is_ok());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn dropped_receiver_reports_closed() {
        let (sub, rx) = Subscription::open(None, 4);
        drop(rx);
        assert!(matches!(
            sub.send(message()),
            Err(HubError::SubscriptionClosed(_))
        ));
    }
}
