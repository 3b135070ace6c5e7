//! Battle events and the bus that carries them.
//!
//! Synchronous listeners are keyed by [`EventKind`] and run inside `emit`;
//! async consumers subscribe to the whole stream or to specific [`Topic`]s.

mod bus;
mod sinks;
mod types;

pub use bus::{BusError, EventBus, EventStream, Listener, Topic};
pub use sinks::{RoundTracker, RoundView, TracingRenderSink, interrupt_message};
pub use types::{
    BattleEvent, CountdownDrift, CountdownFinished, CountdownStarted, CountdownTick, EventKind,
    InterruptRaised, InterruptResolved, MatchConcluded, MatchEnd, MatchStarted, RoundPrompt,
    RoundResolved, RoundStarted, StateChanged, StatSelected, TimerSuspension,
};
