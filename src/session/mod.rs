//! Voice search session management
//!
//! This module provides the `SessionController` state machine that manages:
//! - Start/stop serialization with guard flags
//! - Pre-flight cleanup of a bridge that may still be mid-session
//! - Per-session event handler installation (`EventDispatcher`)
//! - Timeout recovery when the bridge never confirms a start
//! - Reactive state for the UI

mod config;
mod controller;
mod dispatcher;
mod state;

pub use config::SessionConfig;
pub use controller::{ErrorCallback, ResultCallback, SessionCallbacks, SessionController};
pub use dispatcher::EventDispatcher;
pub use state::{Phase, Session, VoiceSearchState};
