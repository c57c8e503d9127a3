// In-process speech bridge driven by a script
//
// Used by the demo binary and the test suite to stand in for the platform
// recognizer. Every call is recorded so callers can assert on ordering.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

use super::capability::{BridgeEvent, SpeechBridge};
use super::hub::{EventHub, EventSink, Subscription};
use crate::error::BridgeError;

/// A call made against the simulated bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    IsAvailable,
    IsRecognizing,
    Start(String),
    Stop,
    Cancel,
}

/// How an optional query method behaves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBehavior {
    /// The method is not exposed
    Unsupported,
    /// The method answers with a fixed value
    Answer(bool),
    /// The method fails with the given message
    Fail(String),
}

/// Scripted bridge behavior
#[derive(Debug, Clone)]
pub struct Script {
    /// Behavior of `is_available`
    pub availability: QueryBehavior,
    /// Whether `is_recognizing` is exposed (answers from internal state)
    pub recognizing_query: bool,
    /// Error returned by `start`
    pub start_error: Option<String>,
    /// Error returned by `stop`
    pub stop_error: Option<String>,
    /// Error returned by `cancel`
    pub cancel_error: Option<String>,
    /// Events emitted during a successful `start`, before it resolves
    pub emit_on_start: Vec<BridgeEvent>,
    /// Events emitted right after a successful `stop`
    pub emit_on_stop: Vec<BridgeEvent>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            availability: QueryBehavior::Answer(true),
            recognizing_query: true,
            start_error: None,
            stop_error: None,
            cancel_error: None,
            emit_on_start: Vec::new(),
            emit_on_stop: Vec::new(),
        }
    }
}

/// Scripted speech bridge
#[derive(Default)]
pub struct SimulatedBridge {
    hub: EventHub,
    script: Mutex<Script>,
    calls: Mutex<Vec<BridgeCall>>,
    recognizing: AtomicBool,
}

impl SimulatedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            ..Self::default()
        }
    }

    /// Replace the script for subsequent calls
    pub fn set_script(&self, script: Script) {
        if let Ok(mut current) = self.script.lock() {
            *current = script;
        }
    }

    /// Pretend a session is (or is not) already running
    pub fn set_recognizing(&self, recognizing: bool) {
        self.recognizing.store(recognizing, Ordering::SeqCst);
    }

    /// Emit an event to every registered listener
    pub fn emit(&self, event: BridgeEvent) -> usize {
        debug!("Simulated bridge emitting {}", event.kind());
        self.hub.emit(event)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Session-affecting calls only (`start`, `stop`, `cancel`)
    pub fn session_calls(&self) -> Vec<BridgeCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    BridgeCall::Start(_) | BridgeCall::Stop | BridgeCall::Cancel
                )
            })
            .collect()
    }

    pub fn start_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BridgeCall::Start(_)))
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    fn record(&self, call: BridgeCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn script(&self) -> Script {
        self.script.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechBridge for SimulatedBridge {
    async fn is_available(&self) -> Option<Result<bool, BridgeError>> {
        match self.script().availability {
            QueryBehavior::Unsupported => None,
            QueryBehavior::Answer(available) => {
                self.record(BridgeCall::IsAvailable);
                Some(Ok(available))
            }
            QueryBehavior::Fail(message) => {
                self.record(BridgeCall::IsAvailable);
                Some(Err(BridgeError::call(message)))
            }
        }
    }

    async fn is_recognizing(&self) -> Option<Result<bool, BridgeError>> {
        if !self.script().recognizing_query {
            return None;
        }

        self.record(BridgeCall::IsRecognizing);
        Some(Ok(self.recognizing.load(Ordering::SeqCst)))
    }

    async fn start(&self, language: &str) -> Result<(), BridgeError> {
        self.record(BridgeCall::Start(language.to_string()));
        let script = self.script();

        if let Some(message) = script.start_error {
            return Err(BridgeError::call(message));
        }

        self.recognizing.store(true, Ordering::SeqCst);
        let eager = !script.emit_on_start.is_empty();
        for event in script.emit_on_start {
            self.emit(event);
        }
        if eager {
            // Listeners see the events before the call resolves.
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.record(BridgeCall::Stop);
        let script = self.script();

        if let Some(message) = script.stop_error {
            return Err(BridgeError::call(message));
        }

        self.recognizing.store(false, Ordering::SeqCst);
        for event in script.emit_on_stop {
            self.emit(event);
        }

        Ok(())
    }

    async fn cancel(&self) -> Result<(), BridgeError> {
        self.record(BridgeCall::Cancel);

        if let Some(message) = self.script().cancel_error {
            return Err(BridgeError::call(message));
        }

        self.recognizing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.hub.subscribe(sink)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
