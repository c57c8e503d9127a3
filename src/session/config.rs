use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for voice search sessions
///
/// The settle delays are heuristics: the bridge's internal teardown latency
/// is unobservable, so they only make a race less likely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Recognition language passed to the bridge (e.g., "en-US")
    pub language: String,

    /// Pause after each pre-flight `stop`/`cancel` call
    pub pre_clean_settle: Duration,

    /// Pause between `stop` and `cancel` when the user stops listening
    pub stop_settle: Duration,

    /// How long to wait for the bridge's speech start event before
    /// releasing the start guard
    pub start_timeout: Duration,

    /// Delay before the mount-time availability probe is scheduled
    pub mount_delay: Duration,

    /// Additional delay before the probe queries the bridge
    pub probe_delay: Duration,

    /// Capacity of the per-session event channel
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            pre_clean_settle: Duration::from_millis(100),
            stop_settle: Duration::from_millis(100),
            start_timeout: Duration::from_secs(2),
            mount_delay: Duration::from_millis(500),
            probe_delay: Duration::from_millis(100),
            event_buffer: 32,
        }
    }
}
