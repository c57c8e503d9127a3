//! Public voice search surface
//!
//! `VoiceSearch` is what the microphone button and the listening overlay
//! talk to. Mounting it schedules the availability probe; unmounting stops
//! any live session and unregisters from the bridge.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::availability::AvailabilityProber;
use crate::bridge::BridgeSource;
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::error::RecognitionError;
use crate::notice::{LogNotifier, Notifier};
use crate::permission::{PermissionGate, StaticPermission};
use crate::session::{
    ErrorCallback, Phase, ResultCallback, SessionCallbacks, SessionConfig, SessionController,
    VoiceSearchState,
};

/// Caller options
#[derive(Clone, Default)]
pub struct VoiceSearchOptions {
    pub on_result: Option<ResultCallback>,
    pub on_error: Option<ErrorCallback>,
    /// Overrides the configured language (default "en-US")
    pub language: Option<String>,
}

impl VoiceSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_result(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(RecognitionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Builder wiring the collaborators of a `VoiceSearch`
pub struct VoiceSearchBuilder {
    source: Arc<dyn BridgeSource>,
    permission: Arc<dyn PermissionGate>,
    notifier: Arc<dyn Notifier>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    options: VoiceSearchOptions,
    config: SessionConfig,
}

impl VoiceSearchBuilder {
    pub fn permission(mut self, permission: Arc<dyn PermissionGate>) -> Self {
        self.permission = permission;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(mut self, options: VoiceSearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build and schedule the availability probe
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(self) -> VoiceSearch {
        let mut config = self.config;
        if let Some(language) = self.options.language {
            config.language = language;
        }

        let callbacks = SessionCallbacks {
            on_result: self.options.on_result,
            on_error: self.options.on_error,
        };

        let mount_delay = config.mount_delay;
        let probe_delay = config.probe_delay;
        let controller = SessionController::new(
            config,
            Arc::clone(&self.source),
            self.permission,
            self.notifier,
            Arc::clone(&self.diagnostics),
            callbacks,
        );

        let prober = AvailabilityProber::new(self.source, self.diagnostics);
        let probe_target = controller.clone();
        let probe_task = tokio::spawn(async move {
            let availability = prober.probe_after(mount_delay, probe_delay).await;
            probe_target.set_availability(availability);
        });

        VoiceSearch {
            controller,
            probe_task: Mutex::new(Some(probe_task)),
        }
    }
}

/// Voice search handle used by the UI
pub struct VoiceSearch {
    controller: SessionController,
    probe_task: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceSearch {
    pub fn builder(source: Arc<dyn BridgeSource>) -> VoiceSearchBuilder {
        VoiceSearchBuilder {
            source,
            permission: Arc::new(StaticPermission),
            notifier: Arc::new(LogNotifier),
            diagnostics: Arc::new(TracingDiagnostics),
            options: VoiceSearchOptions::default(),
            config: SessionConfig::default(),
        }
    }

    /// Start listening; no-op if already starting or listening
    pub async fn start_listening(&self) {
        self.controller.start_listening().await;
    }

    /// Stop listening; safe in any state
    pub async fn stop_listening(&self) {
        self.controller.stop_listening().await;
    }

    pub fn is_listening(&self) -> bool {
        self.controller.is_listening()
    }

    pub fn is_available(&self) -> bool {
        self.controller.is_available()
    }

    pub fn error(&self) -> Option<String> {
        self.controller.error()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn state(&self) -> VoiceSearchState {
        self.controller.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<VoiceSearchState> {
        self.controller.subscribe()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Wait for the mount-time probe to finish
    pub async fn probe_finished(&self) {
        let task = self.probe_slot().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                debug!("Availability probe did not finish: {}", e);
            }
        }
    }

    /// Teardown: cancel the probe, stop any session, drop bridge handlers
    pub async fn unmount(self) {
        if let Some(task) = self.probe_slot().take() {
            task.abort();
        }
        self.controller.shutdown().await;
    }

    fn probe_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.probe_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for VoiceSearch {
    fn drop(&mut self) {
        if let Some(task) = self.probe_slot().take() {
            task.abort();
        }

        // Dropped without `unmount`: stop in the background if possible.
        if self.controller.phase() != Phase::Idle {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let controller = self.controller.clone();
                handle.spawn(async move { controller.shutdown().await });
            }
        }
    }
}
