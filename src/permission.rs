//! Microphone permission gate
//!
//! Platforms with a runtime permission model prompt the user before every
//! session. Platforms with install-time declarations pass straight through.
//! A denial is never cached: the user may change the setting at any time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Asks for microphone access before a session starts
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Returns true only when recording is allowed
    async fn request_permission(&self) -> bool;
}

/// Human-readable justification shown with the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRationale {
    pub title: String,
    pub message: String,
    pub button_positive: String,
    pub button_negative: String,
}

impl Default for PermissionRationale {
    fn default() -> Self {
        Self {
            title: "Microphone Permission".to_string(),
            message: "This app needs access to your microphone to search products by voice."
                .to_string(),
            button_positive: "OK".to_string(),
            button_negative: "Cancel".to_string(),
        }
    }
}

/// Answer from the platform prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
    NeverAskAgain,
}

/// Platform prompt used by `RuntimePermission`
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    async fn request(&self, rationale: &PermissionRationale) -> anyhow::Result<PermissionOutcome>;
}

/// Gate for install-time permission models, always grants
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticPermission;

#[async_trait]
impl PermissionGate for StaticPermission {
    async fn request_permission(&self) -> bool {
        true
    }
}

/// Gate for runtime permission models, prompts every time
pub struct RuntimePermission<P> {
    prompt: P,
    rationale: PermissionRationale,
}

impl<P: PermissionPrompt> RuntimePermission<P> {
    pub fn new(prompt: P) -> Self {
        Self {
            prompt,
            rationale: PermissionRationale::default(),
        }
    }

    pub fn with_rationale(mut self, rationale: PermissionRationale) -> Self {
        self.rationale = rationale;
        self
    }
}

#[async_trait]
impl<P: PermissionPrompt> PermissionGate for RuntimePermission<P> {
    async fn request_permission(&self) -> bool {
        match self.prompt.request(&self.rationale).await {
            Ok(PermissionOutcome::Granted) => true,
            Ok(outcome) => {
                info!("Microphone permission not granted: {:?}", outcome);
                false
            }
            Err(e) => {
                warn!("Microphone permission request failed: {}", e);
                false
            }
        }
    }
}
