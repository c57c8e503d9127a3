pub mod capability;
pub mod hub;
pub mod simulated;

pub use capability::{BridgeEvent, BridgeHandle, BridgeSource, SpeechBridge, StaticBridgeSource};
pub use hub::{EventHub, EventSink, Subscription};
pub use simulated::{BridgeCall, QueryBehavior, Script, SimulatedBridge};
