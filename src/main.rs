use anyhow::Result;
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use grocer_voice::{
    BridgeEvent, Config, PermissionGate, PermissionOutcome, PermissionPrompt,
    PermissionRationale, RuntimePermission, Script, SimulatedBridge, StaticBridgeSource,
    StaticPermission, VoiceSearch, VoiceSearchOptions,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Drive the voice search controller against a simulated recognizer
#[derive(Debug, Parser)]
#[command(name = "grocer-voice", version)]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/grocer-voice")]
    config: String,

    /// Recognition language override
    #[arg(long)]
    language: Option<String>,

    /// Scenario to run
    #[arg(long, value_enum, default_value_t = Scenario::Happy)]
    scenario: Scenario,

    /// Transcript the simulated recognizer returns
    #[arg(long, default_value = "apples")]
    transcript: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Start, hear speech, deliver a result
    Happy,
    /// Start, then stop before any result arrives
    Interrupt,
    /// Recognizer reports an error mid-session
    Error,
    /// No recognizer on this device
    Unavailable,
    /// User refuses microphone access
    Denied,
}

struct DenyingPrompt;

#[async_trait]
impl PermissionPrompt for DenyingPrompt {
    async fn request(&self, rationale: &PermissionRationale) -> Result<PermissionOutcome> {
        info!("Prompt: {} ({})", rationale.title, rationale.message);
        Ok(PermissionOutcome::Denied)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} voice search demo", cfg.service.name);
    info!("Scenario: {:?}", args.scenario);

    let bridge = Arc::new(SimulatedBridge::with_script(script_for(
        args.scenario,
        &args.transcript,
    )));
    let source = match args.scenario {
        Scenario::Unavailable => StaticBridgeSource::missing(),
        _ => StaticBridgeSource::new(bridge.clone()),
    };

    let permission: Arc<dyn PermissionGate> = match args.scenario {
        Scenario::Denied => Arc::new(RuntimePermission::new(DenyingPrompt).with_rationale(
            PermissionRationale {
                title: "Voice Search".to_string(),
                ..PermissionRationale::default()
            },
        )),
        _ => Arc::new(StaticPermission),
    };

    let mut options = VoiceSearchOptions::new()
        .on_result(|text| info!("Search for: {}", text))
        .on_error(|err| info!("Voice search failed: {}", err));
    if let Some(language) = args.language {
        options = options.language(language);
    }

    let voice = VoiceSearch::builder(Arc::new(source))
        .permission(permission)
        .options(options)
        .config(cfg.session())
        .mount();

    voice.probe_finished().await;
    info!("Available: {}", voice.is_available());

    voice.start_listening().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    info!("State after start: {:?}", voice.state());

    match args.scenario {
        Scenario::Happy => {
            bridge.emit(BridgeEvent::SpeechResults(json!({ "value": [args.transcript] })));
        }
        Scenario::Interrupt => voice.stop_listening().await,
        Scenario::Error => {
            bridge.emit(BridgeEvent::SpeechError(
                json!({ "error": { "message": "7/No match" } }),
            ));
        }
        Scenario::Unavailable | Scenario::Denied => {}
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    info!("Final state: {:?}", voice.state());
    info!("Bridge calls: {:?}", bridge.calls());

    voice.unmount().await;

    Ok(())
}

fn script_for(scenario: Scenario, transcript: &str) -> Script {
    let mut script = Script {
        emit_on_start: vec![BridgeEvent::SpeechStart],
        ..Script::default()
    };

    if scenario == Scenario::Happy {
        script.emit_on_start.push(BridgeEvent::SpeechPartialResults(
            json!({ "value": [transcript.chars().take(3).collect::<String>()] }),
        ));
    }

    script
}
