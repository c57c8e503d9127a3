use serde::{Deserialize, Serialize};
use tracing::warn;

/// Blocking, user-facing notice raised when a session cannot start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// Speech recognition is missing on this device
    ModuleUnavailable,
    /// Microphone access was refused for this attempt
    PermissionDenied,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::ModuleUnavailable => "Voice Search Unavailable",
            Self::PermissionDenied => "Permission Denied",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::ModuleUnavailable => {
                "Voice recognition is not available on this device. Please type your search instead."
            }
            Self::PermissionDenied => {
                "Microphone permission is required for voice search. You can enable it in Settings."
            }
        }
    }
}

/// Presents notices to the user (alert dialog, toast, ...)
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        warn!("{}: {}", notice.title(), notice.message());
    }
}
