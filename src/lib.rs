pub mod availability;
pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod notice;
pub mod permission;
pub mod session;
pub mod voice_search;

pub use availability::{classify_probe_error, Availability, AvailabilityProber};
pub use bridge::{
    BridgeCall, BridgeEvent, BridgeHandle, BridgeSource, EventHub, QueryBehavior, Script,
    SimulatedBridge, SpeechBridge, StaticBridgeSource, Subscription,
};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticsSink, RecordingDiagnostics, TracingDiagnostics};
pub use error::{normalize_error, BridgeError, RecognitionError, VoiceError};
pub use notice::{LogNotifier, Notice, Notifier};
pub use permission::{
    PermissionGate, PermissionOutcome, PermissionPrompt, PermissionRationale,
    RuntimePermission, StaticPermission,
};
pub use session::{Phase, Session, SessionConfig, SessionController, VoiceSearchState};
pub use voice_search::{VoiceSearch, VoiceSearchBuilder, VoiceSearchOptions};
