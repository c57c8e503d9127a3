// Shared fixtures for voice search integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use grocer_voice::{
    BridgeSource, Notice, Notifier, PermissionGate, RecognitionError, RecordingDiagnostics,
    SessionConfig, SessionController, SimulatedBridge, StaticBridgeSource, StaticPermission,
};
use grocer_voice::session::SessionCallbacks;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Let spawned tasks (event routing, timers) run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Permission gate answering from a queue (then granting)
#[derive(Default)]
pub struct QueuedPermission {
    answers: Mutex<Vec<bool>>,
    pub requests: AtomicUsize,
}

impl QueuedPermission {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: Mutex::new(answers),
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PermissionGate for QueuedPermission {
    async fn request_permission(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            true
        } else {
            answers.remove(0)
        }
    }
}

/// Permission gate that blocks until released
#[derive(Default)]
pub struct HeldPermission {
    pub release: Notify,
}

#[async_trait]
impl PermissionGate for HeldPermission {
    async fn request_permission(&self) -> bool {
        self.release.notified().await;
        true
    }
}

pub struct Harness {
    pub bridge: Arc<SimulatedBridge>,
    pub controller: SessionController,
    pub results: Arc<Mutex<Vec<String>>>,
    pub errors: Arc<Mutex<Vec<RecognitionError>>>,
    pub notifier: Arc<RecordingNotifier>,
    pub diagnostics: Arc<RecordingDiagnostics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(SimulatedBridge::new(), Arc::new(StaticPermission), true)
    }

    pub fn with_bridge(bridge: SimulatedBridge) -> Self {
        Self::build(bridge, Arc::new(StaticPermission), true)
    }

    pub fn with_permission(permission: Arc<dyn PermissionGate>) -> Self {
        Self::build(SimulatedBridge::new(), permission, true)
    }

    /// Harness whose bridge source reports no capability
    pub fn without_bridge() -> Self {
        Self::build(SimulatedBridge::new(), Arc::new(StaticPermission), false)
    }

    fn build(bridge: SimulatedBridge, permission: Arc<dyn PermissionGate>, present: bool) -> Self {
        let bridge = Arc::new(bridge);
        let source: Arc<dyn BridgeSource> = if present {
            Arc::new(StaticBridgeSource::new(bridge.clone()))
        } else {
            Arc::new(StaticBridgeSource::missing())
        };

        let results = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let diagnostics = Arc::new(RecordingDiagnostics::new());

        let result_sink = Arc::clone(&results);
        let error_sink = Arc::clone(&errors);
        let callbacks = SessionCallbacks {
            on_result: Some(Arc::new(move |text: String| result_sink.lock().unwrap().push(text))),
            on_error: Some(Arc::new(move |err: RecognitionError| error_sink.lock().unwrap().push(err))),
        };

        let controller = SessionController::new(
            SessionConfig::default(),
            source,
            permission,
            notifier.clone(),
            diagnostics.clone(),
            callbacks,
        );

        Self {
            bridge,
            controller,
            results,
            errors,
            notifier,
            diagnostics,
        }
    }

    pub fn results(&self) -> Vec<String> {
        self.results.lock().unwrap().clone()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }
}
