//! # Broadcast Hub
//!
//! The hub tracks the open set of live subscriber channels and fans each
//! rendered state payload out to all of them.
//!
//! Design points:
//!
//! - **Shared payloads**: a broadcast wraps the payload in an `Arc` once and
//!   every subscriber receives a pointer to the same string, so fan-out cost
//!   does not grow with payload size.
//! - **Failure isolation**: each send is independent. A subscriber whose
//!   channel is gone is logged and left registered — its owning connection
//!   task detects the close and unregisters it. No subscriber can block or
//!   fail delivery to another (channels are unbounded, sends never wait).
//! - **Single mutation discipline**: the registry is one mutex-guarded map,
//!   shared between the poll-loop task (broadcaster) and per-connection
//!   tasks (register/unregister), so there is no iterate-while-mutate
//!   hazard.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

static NEXT_SUBSCRIBER_ID: AtomicUsize = AtomicUsize::new(1);

/// Registry of live subscriber channels plus the most recent payload, kept
/// so newly connecting subscribers have something to display immediately.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<usize, mpsc::UnboundedSender<Arc<String>>>>,
    latest: Mutex<Option<Arc<String>>>,
}

impl BroadcastHub {
    /// An empty hub with no payload cached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// Returns its id, the receiving end of its channel, and the most
    /// recent payload (if any) for immediate display.
    pub fn register(
        &self,
    ) -> (
        usize,
        mpsc::UnboundedReceiver<Arc<String>>,
        Option<Arc<String>>,
    ) {
        let id = NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("hub registry lock poisoned")
            .insert(id, tx);
        let latest = self.latest.lock().expect("hub latest lock poisoned").clone();
        log::info!("subscriber {id} registered");
        (id, rx, latest)
    }

    /// Remove a subscriber's channel from the registry.
    pub fn unregister(&self, id: usize) {
        let removed = self
            .subscribers
            .lock()
            .expect("hub registry lock poisoned")
            .remove(&id)
            .is_some();
        if removed {
            log::info!("subscriber {id} unregistered");
        }
    }

    /// Push `payload` to every registered subscriber and cache it for
    /// late joiners. Broadcasting to an empty registry is a no-op.
    ///
    /// A failed send means the receiving task is gone; it is logged and the
    /// entry is left for that task's cleanup path to remove.
    pub fn broadcast(&self, payload: String) {
        let payload = Arc::new(payload);
        *self.latest.lock().expect("hub latest lock poisoned") = Some(Arc::clone(&payload));

        let subscribers = self.subscribers.lock().expect("hub registry lock poisoned");
        for (id, sender) in subscribers.iter() {
            if sender.send(Arc::clone(&payload)).is_err() {
                log::warn!("subscriber {id} channel closed, payload dropped for it");
            }
        }
    }

    /// Shutdown: close every subscriber channel and clear the registry and
    /// the cached payload. A drain, not a broadcast.
    pub fn drain(&self) {
        let drained = {
            let mut subscribers = self.subscribers.lock().expect("hub registry lock poisoned");
            let count = subscribers.len();
            subscribers.clear();
            count
        };
        *self.latest.lock().expect("hub latest lock poisoned") = None;
        if drained > 0 {
            log::info!("hub drained, closed {drained} subscriber channels");
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .expect("hub registry lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_to_empty_registry_is_a_noop() {
        let hub = BroadcastHub::new();
        hub.broadcast("state-1".to_string());
        assert_eq!(hub.subscriber_count(), 0);

        // The payload is still cached for the next subscriber.
        let (_id, _rx, latest) = hub.register();
        assert_eq!(latest.as_deref().map(String::as_str), Some("state-1"));
    }

    #[tokio::test]
    async fn new_subscriber_has_no_payload_before_first_broadcast() {
        let hub = BroadcastHub::new();
        let (_id, _rx, latest) = hub.register();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_broadcast() {
        let hub = BroadcastHub::new();
        let (_a, mut rx_a, _) = hub.register();
        let (_b, mut rx_b, _) = hub.register();

        hub.broadcast("state-1".to_string());
        hub.broadcast("state-2".to_string());

        assert_eq!(rx_a.recv().await.unwrap().as_str(), "state-1");
        assert_eq!(rx_a.recv().await.unwrap().as_str(), "state-2");
        assert_eq!(rx_b.recv().await.unwrap().as_str(), "state-1");
        assert_eq!(rx_b.recv().await.unwrap().as_str(), "state-2");
    }

    #[tokio::test]
    async fn dead_subscriber_does_not_affect_the_rest() {
        let hub = BroadcastHub::new();
        let (id_a, rx_a, _) = hub.register();
        let (_b, mut rx_b, _) = hub.register();

        // Subscriber A's task is gone; its channel is closed but the entry
        // stays until its connection path unregisters it.
        drop(rx_a);
        hub.broadcast("state-1".to_string());

        assert_eq!(rx_b.recv().await.unwrap().as_str(), "state-1");
        assert_eq!(hub.subscriber_count(), 2);

        hub.unregister(id_a);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = BroadcastHub::new();
        let (id, _rx, _) = hub.register();
        hub.unregister(id);
        hub.unregister(id);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn drain_closes_channels_and_clears_state() {
        let hub = BroadcastHub::new();
        hub.broadcast("state-1".to_string());
        let (_id, mut rx, _) = hub.register();

        hub.drain();

        // Channel closed: recv resolves to None once drained.
        assert!(rx.recv().await.is_none());
        assert_eq!(hub.subscriber_count(), 0);
        let (_id2, _rx2, latest) = hub.register();
        assert!(latest.is_none());
    }
}
