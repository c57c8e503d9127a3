use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::hub::{EventSink, Subscription};
use crate::error::BridgeError;

/// Event emitted asynchronously by a speech bridge
///
/// Payloads are kept raw: bridge implementations disagree on their shape,
/// so consumers must parse them defensively.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The recognizer started capturing speech
    SpeechStart,
    /// The recognizer stopped capturing speech
    SpeechEnd,
    /// Final candidate transcriptions (`{ "value": [...] }`)
    SpeechResults(Value),
    /// Recognition failed
    SpeechError(Value),
    /// Interim candidate transcriptions
    SpeechPartialResults(Value),
}

impl BridgeEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpeechStart => "speech_start",
            Self::SpeechEnd => "speech_end",
            Self::SpeechResults(_) => "speech_results",
            Self::SpeechError(_) => "speech_error",
            Self::SpeechPartialResults(_) => "speech_partial_results",
        }
    }
}

/// Platform speech recognition capability
///
/// The bridge is an unreliable black box:
/// - query methods are optional (`None` = the platform does not expose them)
/// - every call may fail, or succeed without doing anything
/// - events may arrive late or not at all (notably after a forced `cancel`)
#[async_trait]
pub trait SpeechBridge: Send + Sync {
    /// Whether recognition is usable on this device
    async fn is_available(&self) -> Option<Result<bool, BridgeError>> {
        None
    }

    /// Whether the recognizer believes a session is running
    async fn is_recognizing(&self) -> Option<Result<bool, BridgeError>> {
        None
    }

    /// Begin a recognition session
    async fn start(&self, language: &str) -> Result<(), BridgeError>;

    /// Gracefully end the current session
    async fn stop(&self) -> Result<(), BridgeError>;

    /// Abort the current session
    async fn cancel(&self) -> Result<(), BridgeError>;

    /// Register an event listener
    ///
    /// The listener stays registered until the returned `Subscription` is
    /// dropped or disposed.
    fn subscribe(&self, sink: EventSink) -> Subscription;

    /// Get bridge name for logging
    fn name(&self) -> &str;
}

/// Shared handle to a bridge
pub type BridgeHandle = Arc<dyn SpeechBridge>;

/// Lazily acquires the bridge handle
///
/// Called again before every session: the host may wire the capability
/// late, or lose it.
pub trait BridgeSource: Send + Sync {
    fn acquire(&self) -> Option<BridgeHandle>;
}

impl<F> BridgeSource for F
where
    F: Fn() -> Option<BridgeHandle> + Send + Sync,
{
    fn acquire(&self) -> Option<BridgeHandle> {
        self()
    }
}

/// Bridge source with a fixed answer
#[derive(Clone)]
pub struct StaticBridgeSource {
    handle: Option<BridgeHandle>,
}

impl StaticBridgeSource {
    pub fn new(handle: BridgeHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Source for a platform without the capability
    pub fn missing() -> Self {
        Self { handle: None }
    }
}

impl BridgeSource for StaticBridgeSource {
    fn acquire(&self) -> Option<BridgeHandle> {
        self.handle.clone()
    }
}
