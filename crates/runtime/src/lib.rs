//! Runtime orchestration for head-to-head stat battles.
//!
//! This crate wires the pure round rules from `battle-core` to timers, an
//! event bus and pluggable contestant sources. Consumers embed [`Runtime`] to
//! host a battle and drive it through [`BattleHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the event bus, payloads and render sinks
//! - [`timer`] implements drift-aware countdowns
//! - [`readiness`] turns milestones into awaitable gates
//! - [`diagnostics`] records transitions for debugging and tests
//! - `workers` keeps the battle state machine internal to the crate
pub mod api;
pub mod diagnostics;
pub mod events;
pub mod readiness;
pub mod runtime;
pub mod selection;
pub mod timer;

mod workers;

pub use api::{
    BattleHandle, BattleSnapshot, ContestantSource, DrawError, FixedSettings, Result,
    RuntimeError, ScriptedSource, SettingsProvider,
};
pub use diagnostics::{
    DiagnosticsSink, InterruptRecord, NoopDiagnostics, TransitionLog, TransitionRecord,
};
pub use events::{
    BattleEvent, BusError, EventBus, EventKind, EventStream, Listener, MatchEnd, RoundTracker,
    RoundView, Topic, TracingRenderSink,
};
pub use readiness::{Milestone, Readiness, ReadinessError, ReadinessWait};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use selection::{AutoSelectPolicy, PolicyParseError};
pub use timer::{CountdownCallbacks, CountdownTimer, TimerCategory, TimerHandle, TimerSettings};
