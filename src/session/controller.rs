use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::SessionConfig;
use super::dispatcher::EventDispatcher;
use super::state::{Phase, Session, VoiceSearchState};
use crate::availability::Availability;
use crate::bridge::{BridgeEvent, BridgeHandle, BridgeSource};
use crate::diagnostics::{Diagnostic, DiagnosticsSink, IgnoreReason};
use crate::error::{first_candidate, normalize_error, RecognitionError, VoiceError};
use crate::notice::{Notice, Notifier};
use crate::permission::PermissionGate;

/// Called with the first candidate transcription of a session
pub type ResultCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Called with every recognition or transport failure
pub type ErrorCallback = Arc<dyn Fn(RecognitionError) + Send + Sync>;

/// Caller-supplied result and error callbacks
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    pub on_result: Option<ResultCallback>,
    pub on_error: Option<ErrorCallback>,
}

/// How the start sequence ended
enum StartOutcome {
    /// `start` was issued and the bridge accepted it
    Issued,
    /// A stop overtook the start sequence
    Aborted,
}

#[derive(Default)]
struct Core {
    phase: Phase,
    session: Option<Session>,
    /// Session whose handlers are currently installed on the bridge
    installed: Option<Uuid>,
    availability: Availability,
    error: Option<String>,
}

impl Core {
    fn owns(&self, session_id: Uuid) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == session_id)
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.session = None;
    }

    fn snapshot(&self) -> VoiceSearchState {
        VoiceSearchState {
            phase: self.phase,
            is_listening: self.phase == Phase::Listening,
            availability: self.availability,
            is_available: self.availability.is_available(),
            error: self.error.clone(),
        }
    }
}

struct Inner {
    /// Language, settle delays and start timeout
    config: SessionConfig,

    /// Acquires the bridge on every start and stop
    source: Arc<dyn BridgeSource>,

    /// Consulted before every start, never cached
    permission: Arc<dyn PermissionGate>,

    /// Shows blocking notices for a missing bridge or denied permission
    notifier: Arc<dyn Notifier>,

    /// Receives every controller event
    diagnostics: Arc<dyn DiagnosticsSink>,

    /// Caller's result and error handlers
    callbacks: SessionCallbacks,

    /// Set while the start sequence runs, until the bridge confirms or a
    /// terminal transition or the start timeout clears it
    is_starting: AtomicBool,

    /// Set while a forced stop runs
    is_stopping: AtomicBool,

    /// Phase, live session and availability
    core: Mutex<Core>,

    /// Event routing for the installed session
    dispatcher: Mutex<Option<EventDispatcher>>,

    /// Publishes a snapshot after every state change
    state_tx: watch::Sender<VoiceSearchState>,
}

/// Voice search session state machine
///
/// `Idle -> Starting -> Listening -> Idle`, with `Stopping` reachable from
/// `Starting` and `Listening`. `Listening` is only entered when the bridge
/// emits its speech start event. Every path back to `Idle` clears the guard
/// flags, and none of them depends on the bridge emitting anything.
///
/// The controller is the only component that calls `start`, `stop` or
/// `cancel` on the bridge.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn BridgeSource>,
        permission: Arc<dyn PermissionGate>,
        notifier: Arc<dyn Notifier>,
        diagnostics: Arc<dyn DiagnosticsSink>,
        callbacks: SessionCallbacks,
    ) -> Self {
        let (state_tx, _) = watch::channel(VoiceSearchState::default());

        Self {
            inner: Arc::new(Inner {
                config,
                source,
                permission,
                notifier,
                diagnostics,
                callbacks,
                is_starting: AtomicBool::new(false),
                is_stopping: AtomicBool::new(false),
                core: Mutex::new(Core::default()),
                dispatcher: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Start a recognition session
    ///
    /// Ignored while a session is starting, listening or being stopped.
    /// Never fails: errors are reported through notices, the error field and
    /// the `on_error` callback.
    pub async fn start_listening(&self) {
        if self
            .inner
            .is_starting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.record(Diagnostic::StartIgnored {
                reason: IgnoreReason::AlreadyStarting,
            });
            return;
        }

        let session = {
            let mut core = self.core();

            let blocker = if self.inner.is_stopping.load(Ordering::SeqCst) {
                Some(IgnoreReason::Stopping)
            } else if core.phase == Phase::Listening {
                Some(IgnoreReason::AlreadyListening)
            } else {
                None
            };

            if let Some(reason) = blocker {
                drop(core);
                self.inner.is_starting.store(false, Ordering::SeqCst);
                self.record(Diagnostic::StartIgnored { reason });
                return;
            }

            let session = Session::new(self.inner.config.language.clone());
            core.phase = Phase::Starting;
            core.session = Some(session.clone());
            core.error = None;
            self.publish(&core);
            session
        };

        info!(
            "Starting voice search session {} ({})",
            session.id, session.language
        );

        match self.run_start(&session).await {
            Ok(StartOutcome::Issued) => {
                if self.is_current_start(session.id) {
                    self.arm_start_timeout(session.id);
                }
            }
            Ok(StartOutcome::Aborted) => {
                self.record(Diagnostic::StartAborted {
                    session_id: session.id,
                });
            }
            Err(VoiceError::ModuleUnavailable) => {
                self.inner.notifier.notify(Notice::ModuleUnavailable);
                self.finish_session(session.id);
            }
            Err(VoiceError::PermissionDenied) => {
                self.inner.notifier.notify(Notice::PermissionDenied);
                self.finish_session(session.id);
            }
            Err(err) => {
                self.record(Diagnostic::StartFailed {
                    message: err.to_string(),
                });
                self.fail_session(session.id, RecognitionError::from(&err));
            }
        }
    }

    /// Stop the current session
    ///
    /// Safe from any state. Calls `stop` then `cancel` on the bridge,
    /// ignoring their failures, and returns to `Idle` whether or not the
    /// bridge ever emits an end event.
    pub async fn stop_listening(&self) {
        {
            let core = self.core();
            if core.phase == Phase::Idle && !self.inner.is_starting.load(Ordering::SeqCst) {
                self.publish(&core);
                drop(core);
                self.record(Diagnostic::StopIgnored);
                return;
            }
        }

        if self
            .inner
            .is_stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Stop already in progress");
            return;
        }

        let previous = {
            let mut core = self.core();
            let previous = core.phase;
            core.phase = Phase::Stopping;
            self.inner.is_starting.store(false, Ordering::SeqCst);
            self.publish(&core);
            previous
        };

        info!("Stopping voice search ({:?})", previous);

        if let Some(bridge) = self.inner.source.acquire() {
            if let Err(e) = bridge.stop().await {
                self.call_failed("stop", e.message());
            }
            tokio::time::sleep(self.inner.config.stop_settle).await;
            if let Err(e) = bridge.cancel().await {
                self.call_failed("cancel", e.message());
            }
        }

        {
            let mut core = self.core();
            core.reset();
            self.inner.is_starting.store(false, Ordering::SeqCst);
            self.inner.is_stopping.store(false, Ordering::SeqCst);
            self.publish(&core);
        }

        debug!("Voice search stopped");
    }

    /// Teardown: stop any session and unregister from the bridge
    pub async fn shutdown(&self) {
        self.stop_listening().await;

        let dispatcher = self.dispatcher_slot().take();
        if let Some(dispatcher) = dispatcher {
            dispatcher.dispose();
        }
        self.core().installed = None;
    }

    /// Record the mount-time probe answer
    pub fn set_availability(&self, availability: Availability) {
        let mut core = self.core();
        core.availability = availability;
        self.publish(&core);
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<VoiceSearchState> {
        self.inner.state_tx.subscribe()
    }

    pub fn state(&self) -> VoiceSearchState {
        self.core().snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.core().phase
    }

    pub fn is_listening(&self) -> bool {
        self.phase() == Phase::Listening
    }

    pub fn is_available(&self) -> bool {
        self.core().availability.is_available()
    }

    pub fn error(&self) -> Option<String> {
        self.core().error.clone()
    }

    pub fn is_starting(&self) -> bool {
        self.inner.is_starting.load(Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.is_stopping.load(Ordering::SeqCst)
    }

    /// Current session, if one is live
    pub fn session(&self) -> Option<Session> {
        self.core().session.clone()
    }

    /// Route a bridge event for `session_id` into the state machine
    ///
    /// Events for any session other than the one whose handlers are
    /// installed are dropped. Payloads are parsed defensively.
    pub fn handle_event(&self, session_id: Uuid, event: BridgeEvent) {
        if self.core().installed != Some(session_id) {
            self.record(Diagnostic::StaleEvent { kind: event.kind() });
            return;
        }

        match event {
            BridgeEvent::SpeechStart => self.on_speech_start(session_id),
            BridgeEvent::SpeechEnd => self.on_speech_end(session_id),
            BridgeEvent::SpeechResults(payload) => {
                let candidate = first_candidate(&payload);
                self.on_speech_results(session_id, candidate);
            }
            BridgeEvent::SpeechError(payload) => {
                self.on_speech_error(session_id, normalize_error(&payload))
            }
            BridgeEvent::SpeechPartialResults(_) => self.record(Diagnostic::PartialResults),
        }
    }

    async fn run_start(&self, session: &Session) -> Result<StartOutcome, VoiceError> {
        let Some(bridge) = self.inner.source.acquire() else {
            self.record(Diagnostic::BridgeUnavailable);
            return Err(VoiceError::ModuleUnavailable);
        };

        if !self.inner.permission.request_permission().await {
            self.record(Diagnostic::PermissionDenied);
            return Err(VoiceError::PermissionDenied);
        }
        if !self.is_current_start(session.id) {
            return Ok(StartOutcome::Aborted);
        }

        self.pre_clean(&bridge).await;
        if !self.is_current_start(session.id) {
            return Ok(StartOutcome::Aborted);
        }

        self.install_handlers(&bridge, session.id);
        debug!("Calling start on {} ({})", bridge.name(), session.language);

        bridge.start(&session.language).await?;

        // Speech start may already have moved the session to Listening.
        let still_live = {
            let core = self.core();
            core.owns(session.id) && matches!(core.phase, Phase::Starting | Phase::Listening)
        };
        if !still_live {
            // The stop already ran its stop/cancel before this start landed.
            if let Err(e) = bridge.cancel().await {
                self.call_failed("cancel", e.message());
            }
            return Ok(StartOutcome::Aborted);
        }

        Ok(StartOutcome::Issued)
    }

    /// Put the bridge into a known-clean state
    ///
    /// Runs `stop` then `cancel` unless the bridge affirmatively reports it
    /// is idle. Failures are expected (there may be nothing to stop).
    async fn pre_clean(&self, bridge: &BridgeHandle) {
        let recognizing = match bridge.is_recognizing().await {
            Some(Ok(recognizing)) => Some(recognizing),
            Some(Err(e)) => {
                self.call_failed("is_recognizing", e.message());
                None
            }
            None => None,
        };

        self.record(Diagnostic::PreClean { recognizing });
        if recognizing == Some(false) {
            return;
        }

        let settle = self.inner.config.pre_clean_settle;
        if let Err(e) = bridge.stop().await {
            self.call_failed("stop", e.message());
        }
        tokio::time::sleep(settle).await;
        if let Err(e) = bridge.cancel().await {
            self.call_failed("cancel", e.message());
        }
        tokio::time::sleep(settle).await;
    }

    fn install_handlers(&self, bridge: &BridgeHandle, session_id: Uuid) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let dispatcher = EventDispatcher::install(
            bridge.as_ref(),
            session_id,
            self.inner.config.event_buffer,
            move |id, event| {
                if let Some(inner) = weak.upgrade() {
                    SessionController { inner }.handle_event(id, event);
                }
            },
        );

        // Mark the new session as installed before the old handlers go away.
        self.core().installed = Some(session_id);
        let previous = self.dispatcher_slot().replace(dispatcher);
        drop(previous);

        debug!("Handlers installed for session {}", session_id);
    }

    fn arm_start_timeout(&self, session_id: Uuid) {
        let weak = Arc::downgrade(&self.inner);
        let timeout = self.inner.config.start_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = SessionController { inner };
            if controller.is_current_start(session_id)
                && controller
                    .inner
                    .is_starting
                    .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
            {
                controller.record(Diagnostic::StartTimedOut { session_id });
            }
        });
    }

    fn on_speech_start(&self, session_id: Uuid) {
        {
            let mut core = self.core();
            if !core.owns(session_id) || core.phase != Phase::Starting {
                drop(core);
                self.record(Diagnostic::StaleEvent {
                    kind: "speech_start",
                });
                return;
            }

            core.phase = Phase::Listening;
            self.inner.is_starting.store(false, Ordering::SeqCst);
            self.publish(&core);
        }

        info!("Listening (session {})", session_id);
    }

    fn on_speech_results(&self, session_id: Uuid, candidate: Option<String>) {
        match candidate {
            Some(text) => {
                self.record(Diagnostic::ResultDelivered { text: text.clone() });
                if let Some(on_result) = &self.inner.callbacks.on_result {
                    on_result(text);
                }
            }
            None => self.record(Diagnostic::ResultEmpty),
        }

        self.finish_session(session_id);
    }

    fn on_speech_error(&self, session_id: Uuid, error: RecognitionError) {
        {
            let core = self.core();
            if !core.owns(session_id) || core.phase == Phase::Stopping {
                drop(core);
                self.record(Diagnostic::StaleEvent {
                    kind: "speech_error",
                });
                return;
            }
        }

        self.record(Diagnostic::RecognitionFailed {
            message: error.message.clone(),
        });
        self.fail_session(session_id, error);
    }

    fn on_speech_end(&self, session_id: Uuid) {
        debug!("Speech ended (session {})", session_id);
        self.finish_session(session_id);
    }

    /// Return to `Idle` if `session_id` is still the live session
    ///
    /// A stop in progress owns the transition and is left alone.
    fn finish_session(&self, session_id: Uuid) {
        let mut core = self.core();
        if !core.owns(session_id) || core.phase == Phase::Stopping {
            return;
        }

        core.reset();
        self.inner.is_starting.store(false, Ordering::SeqCst);
        self.publish(&core);
    }

    fn fail_session(&self, session_id: Uuid, error: RecognitionError) {
        {
            let mut core = self.core();
            if !core.owns(session_id) || core.phase == Phase::Stopping {
                return;
            }

            core.reset();
            core.error = Some(error.message.clone());
            self.inner.is_starting.store(false, Ordering::SeqCst);
            self.publish(&core);
        }

        if let Some(on_error) = &self.inner.callbacks.on_error {
            on_error(error);
        }
    }

    fn is_current_start(&self, session_id: Uuid) -> bool {
        let core = self.core();
        core.owns(session_id) && core.phase == Phase::Starting
    }

    fn call_failed(&self, call: &'static str, message: String) {
        self.record(Diagnostic::BridgeCallFailed { call, message });
    }

    fn record(&self, event: Diagnostic) {
        self.inner.diagnostics.record(event);
    }

    fn publish(&self, core: &Core) {
        self.inner.state_tx.send_replace(core.snapshot());
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        self.inner
            .core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dispatcher_slot(&self) -> MutexGuard<'_, Option<EventDispatcher>> {
        self.inner
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
