//! Mount-time availability probing
//!
//! Decides once whether the speech bridge is usable at all. Ambiguous
//! failures fail open: the user is still allowed to try.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::BridgeSource;
use crate::diagnostics::{Diagnostic, DiagnosticsSink};

/// Tri-state readiness of the speech bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(self) -> bool {
        self == Self::Available
    }
}

/// Error text fragments that mean the capability is structurally absent
const ABSENCE_MARKERS: &[&str] = &[
    "null",
    "undefined is not",
    "cannot read property",
    "cannot read properties",
    "not a function",
    "isavailable",
    "isrecognizing",
    "isspeechavailable",
    "startspeech",
    "stopspeech",
    "cancelspeech",
];

/// Classify a failed availability query by its message
///
/// Messages indicating the capability is missing map to `Unavailable`;
/// anything else (permission prompts, busy hardware) maps to `Available`.
pub fn classify_probe_error(message: &str) -> Availability {
    let message = message.to_lowercase();
    if ABSENCE_MARKERS.iter().any(|marker| message.contains(marker)) {
        Availability::Unavailable
    } else {
        Availability::Available
    }
}

/// Runs the availability policy against a bridge source
pub struct AvailabilityProber {
    source: Arc<dyn BridgeSource>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl AvailabilityProber {
    pub fn new(source: Arc<dyn BridgeSource>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            source,
            diagnostics,
        }
    }

    /// Determine availability
    ///
    /// - no bridge handle: `Unavailable`
    /// - query exposed: its answer
    /// - no query method: `Available` (untested capability)
    /// - query failed: see [`classify_probe_error`]
    pub async fn probe(&self) -> Availability {
        let Some(bridge) = self.source.acquire() else {
            self.diagnostics.record(Diagnostic::BridgeUnavailable);
            return Availability::Unavailable;
        };

        let availability = match bridge.is_available().await {
            Some(Ok(true)) | None => Availability::Available,
            Some(Ok(false)) => Availability::Unavailable,
            Some(Err(err)) => {
                let message = err.message();
                let availability = classify_probe_error(&message);
                self.diagnostics.record(Diagnostic::ProbeFailed {
                    message,
                    availability,
                });
                return availability;
            }
        };

        self.diagnostics
            .record(Diagnostic::ProbeCompleted { availability });
        availability
    }

    /// Probe once the host has had time to wire the bridge
    ///
    /// Waits `mount_delay`, then `probe_delay`, then probes. Meant to run on
    /// a background task so mounting never blocks.
    pub async fn probe_after(&self, mount_delay: Duration, probe_delay: Duration) -> Availability {
        tokio::time::sleep(mount_delay).await;
        tokio::time::sleep(probe_delay).await;
        self.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_noise_fails_open() {
        assert_eq!(classify_probe_error("permission denied"), Availability::Available);
        assert_eq!(classify_probe_error("Audio device busy"), Availability::Available);
        assert_eq!(classify_probe_error(""), Availability::Available);
    }

    #[test]
    fn test_structural_absence_is_unavailable() {
        assert_eq!(
            classify_probe_error("Cannot read property 'isSpeechAvailable' of null"),
            Availability::Unavailable
        );
        assert_eq!(
            classify_probe_error("undefined is not an object"),
            Availability::Unavailable
        );
        assert_eq!(
            classify_probe_error("Voice.startSpeech is not a function"),
            Availability::Unavailable
        );
    }

    #[test]
    fn test_only_available_counts_as_available() {
        assert!(Availability::Available.is_available());
        assert!(!Availability::Unknown.is_available());
        assert!(!Availability::Unavailable.is_available());
    }
}
