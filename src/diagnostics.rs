//! Diagnostic events emitted by the voice search subsystem
//!
//! Controllers and probers report what they do through a `DiagnosticsSink`
//! instead of logging directly, so tests can assert on the event stream.
//! The default sink forwards everything to `tracing`.

use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::availability::Availability;

/// Why a `start_listening` call was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    AlreadyStarting,
    AlreadyListening,
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Diagnostic {
    ProbeCompleted {
        availability: Availability,
    },
    ProbeFailed {
        message: String,
        availability: Availability,
    },
    StartIgnored {
        reason: IgnoreReason,
    },
    BridgeUnavailable,
    PermissionDenied,
    PreClean {
        recognizing: Option<bool>,
    },
    BridgeCallFailed {
        call: &'static str,
        message: String,
    },
    StartAborted {
        session_id: Uuid,
    },
    StartFailed {
        message: String,
    },
    StartTimedOut {
        session_id: Uuid,
    },
    ResultDelivered {
        text: String,
    },
    ResultEmpty,
    PartialResults,
    RecognitionFailed {
        message: String,
    },
    StaleEvent {
        kind: &'static str,
    },
    StopIgnored,
}

/// Receiver for diagnostic events
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: Diagnostic);
}

/// Sink that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, event: Diagnostic) {
        match &event {
            Diagnostic::ProbeFailed { message, availability } => {
                warn!("Availability probe failed ({}), treating as {:?}", message, availability)
            }
            Diagnostic::BridgeUnavailable => warn!("Speech bridge unavailable"),
            Diagnostic::PermissionDenied => warn!("Microphone permission denied"),
            Diagnostic::BridgeCallFailed { call, message } => {
                debug!("Bridge {} failed (ignored): {}", call, message)
            }
            Diagnostic::StartFailed { message } => warn!("Failed to start recognition: {}", message),
            Diagnostic::StartTimedOut { session_id } => {
                warn!("No speech start event for session {}, clearing start guard", session_id)
            }
            Diagnostic::RecognitionFailed { message } => warn!("Recognition error: {}", message),
            Diagnostic::PartialResults | Diagnostic::StaleEvent { .. } => debug!("{:?}", event),
            Diagnostic::StartIgnored { reason } => debug!("start_listening ignored: {:?}", reason),
            Diagnostic::StopIgnored => debug!("stop_listening ignored: nothing active"),
            _ => info!("{:?}", event),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Whether any recorded event matches
    pub fn any(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn record(&self, event: Diagnostic) {
        debug!("{:?}", event);
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
