// End-to-end scenarios through the public VoiceSearch surface

mod common;

use common::{settle, RecordingNotifier};
use grocer_voice::{
    BridgeCall, BridgeEvent, Phase, QueryBehavior, Script, SessionConfig, SimulatedBridge,
    StaticBridgeSource, VoiceSearch, VoiceSearchOptions,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn mount(bridge: &Arc<SimulatedBridge>, options: VoiceSearchOptions) -> VoiceSearch {
    VoiceSearch::builder(Arc::new(StaticBridgeSource::new(bridge.clone())))
        .options(options)
        .mount()
}

#[tokio::test(start_paused = true)]
async fn test_availability_unknown_until_probe_finishes() {
    let bridge = Arc::new(SimulatedBridge::new());
    let voice = mount(&bridge, VoiceSearchOptions::new());

    assert!(!voice.is_available());

    voice.probe_finished().await;
    assert!(voice.is_available());
    assert_eq!(bridge.calls(), vec![BridgeCall::IsAvailable]);
}

#[tokio::test(start_paused = true)]
async fn test_probe_error_fails_open() {
    let bridge = Arc::new(SimulatedBridge::with_script(Script {
        availability: QueryBehavior::Fail("permission denied".to_string()),
        ..Script::default()
    }));
    let voice = mount(&bridge, VoiceSearchOptions::new());

    voice.probe_finished().await;
    assert!(voice.is_available());
}

#[tokio::test(start_paused = true)]
async fn test_missing_capability_is_unavailable_and_blocks_start() {
    let notifier = Arc::new(RecordingNotifier::default());
    let voice = VoiceSearch::builder(Arc::new(StaticBridgeSource::missing()))
        .notifier(notifier.clone())
        .mount();

    voice.probe_finished().await;
    assert!(!voice.is_available());

    voice.start_listening().await;
    assert_eq!(notifier.notices().len(), 1);
    assert_eq!(voice.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_happy_path() {
    let bridge = Arc::new(SimulatedBridge::new());
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&results);
    let voice = mount(
        &bridge,
        VoiceSearchOptions::new().on_result(move |text| sink.lock().unwrap().push(text)),
    );

    voice.start_listening().await;
    assert!(!voice.is_listening());

    bridge.emit(BridgeEvent::SpeechStart);
    settle().await;
    assert!(voice.is_listening());

    bridge.emit(BridgeEvent::SpeechResults(json!({ "value": ["apples"] })));
    settle().await;

    assert_eq!(*results.lock().unwrap(), vec!["apples".to_string()]);
    assert!(!voice.is_listening());
    assert_eq!(voice.error(), None);
}

#[tokio::test(start_paused = true)]
async fn test_error_surfaces_in_state_and_callback() {
    let bridge = Arc::new(SimulatedBridge::new());
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let voice = mount(
        &bridge,
        VoiceSearchOptions::new().on_error(move |err| sink.lock().unwrap().push(err.message)),
    );

    voice.start_listening().await;
    bridge.emit(BridgeEvent::SpeechStart);
    bridge.emit(BridgeEvent::SpeechError(json!({ "error": { "message": "no-match" } })));
    settle().await;

    assert_eq!(*errors.lock().unwrap(), vec!["no-match".to_string()]);
    assert_eq!(voice.error(), Some("no-match".to_string()));
    assert_eq!(voice.state().error, Some("no-match".to_string()));
    assert!(!voice.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_language_option_overrides_config() {
    let bridge = Arc::new(SimulatedBridge::new());
    let voice = VoiceSearch::builder(Arc::new(StaticBridgeSource::new(bridge.clone())))
        .config(SessionConfig {
            language: "fr-FR".to_string(),
            ..SessionConfig::default()
        })
        .options(VoiceSearchOptions::new().language("en-GB"))
        .mount();

    voice.start_listening().await;

    assert_eq!(bridge.session_calls(), vec![BridgeCall::Start("en-GB".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_while_listening() {
    let bridge = Arc::new(SimulatedBridge::new());
    let voice = mount(&bridge, VoiceSearchOptions::new());
    let state = voice.subscribe();

    voice.start_listening().await;
    bridge.emit(BridgeEvent::SpeechStart);
    settle().await;
    assert!(state.borrow().is_listening);

    voice.unmount().await;

    assert!(!state.borrow().is_listening);
    assert_eq!(state.borrow().phase, Phase::Idle);
    assert_eq!(
        bridge.session_calls(),
        vec![
            BridgeCall::Start("en-US".to_string()),
            BridgeCall::Stop,
            BridgeCall::Cancel
        ]
    );
    assert_eq!(bridge.listener_count(), 0);
}
