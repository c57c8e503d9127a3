use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::capability::BridgeEvent;

/// Receiving end registered with a bridge
pub type EventSink = mpsc::Sender<BridgeEvent>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(u64, EventSink)>,
}

/// Observer list a bridge uses to fan its events out to listeners
///
/// Delivery never blocks the emitter: a full or closed sink drops the event.
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Arc<Mutex<HubInner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&self, sink: EventSink) -> Subscription {
        let Ok(mut inner) = self.inner.lock() else {
            warn!("Event hub lock poisoned, listener not registered");
            return Subscription::detached();
        };

        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, sink));
        debug!("Listener {} subscribed ({} total)", id, inner.listeners.len());

        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every listener, returns how many accepted it
    pub fn emit(&self, event: BridgeEvent) -> usize {
        let Ok(mut inner) = self.inner.lock() else {
            return 0;
        };

        let mut delivered = 0;
        inner.listeners.retain(|(id, sink)| match sink.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("Listener {} is full, dropping {} event", id, event.kind());
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });

        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.listeners.len()).unwrap_or(0)
    }
}

/// Disposer for a registered listener
///
/// Unregisters on drop.
#[must_use = "dropping a subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    hub: Weak<Mutex<HubInner>>,
}

impl Subscription {
    /// Subscription bound to nothing
    pub fn detached() -> Self {
        Self {
            id: 0,
            hub: Weak::new(),
        }
    }

    /// Unregister now
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if let Ok(mut inner) = hub.lock() {
                inner.listeners.retain(|(id, _)| *id != self.id);
                debug!("Listener {} unsubscribed", self.id);
            }
        }
    }
}
