use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::bridge::{BridgeEvent, SpeechBridge, Subscription};

/// Event handlers installed on the bridge for one session
///
/// Owns the bridge subscription and the task routing events into the
/// controller. Dropping it unregisters from the bridge and stops routing, so
/// installing a new dispatcher for every session is how stale handlers get
/// replaced.
pub struct EventDispatcher {
    session_id: Uuid,
    subscription: Option<Subscription>,
    task: JoinHandle<()>,
}

impl EventDispatcher {
    /// Subscribe to `bridge` and route every event to `handler`
    ///
    /// `handler` receives the session id the dispatcher was installed for.
    pub fn install<F>(bridge: &dyn SpeechBridge, session_id: Uuid, buffer: usize, handler: F) -> Self
    where
        F: Fn(Uuid, BridgeEvent) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(buffer.max(1));
        let subscription = bridge.subscribe(tx);

        let task = tokio::spawn(async move {
            debug!("Event routing started for session {}", session_id);

            while let Some(event) = rx.recv().await {
                handler(session_id, event);
            }

            debug!("Event routing stopped for session {}", session_id);
        });

        Self {
            session_id,
            subscription: Some(subscription),
            task,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Unregister from the bridge and stop routing
    pub fn dispose(self) {}
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        drop(self.subscription.take());
        self.task.abort();
    }
}
