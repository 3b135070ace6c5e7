//! Deterministic card battle rules shared across the runtime and clients.
//!
//! `battle-core` defines the canonical rules of a match (contestants, scores,
//! round outcomes) and the battle state transition table. Everything here is
//! pure: the runtime owns timers, I/O and the event bus, and drives these
//! types through the [`engine`] functions and [`BattleState::next`].
pub mod config;
pub mod engine;
pub mod error;
pub mod state;

pub use config::MatchConfig;
pub use engine::{
    Comparison, RoundOutcome, RoundResult, apply_outcome, determine_outcome, handle_selection,
    match_winner,
};
pub use error::{BattleError, ConfigError, ContestantError, ErrorSeverity};
pub use state::{
    BattleState, Contestant, ContestantPair, InterruptReason, InterruptResolution, InterruptScope,
    MatchScore, Side, Stat, Trigger,
};
