use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::Availability;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session
    #[default]
    Idle,
    /// Start sequence running, waiting for the bridge to confirm
    Starting,
    /// The bridge confirmed speech capture
    Listening,
    /// Forced stop in progress
    Stopping,
}

/// A single voice search attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier, used to reject stale events and timers
    pub id: Uuid,

    /// Recognition language, fixed for the session
    pub language: String,

    /// When `start_listening` created the session
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            started_at: Utc::now(),
        }
    }
}

/// Snapshot of the reactive fields rendered by the UI
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceSearchState {
    /// Current controller phase
    pub phase: Phase,

    /// Whether the bridge confirmed it is capturing speech
    pub is_listening: bool,

    /// Mount-time probe answer
    pub availability: Availability,

    /// Whether the microphone affordance should be offered
    pub is_available: bool,

    /// Last recognition or transport error, cleared by the next start
    pub error: Option<String>,
}
