//! Event payloads published on the battle event bus.
//!
//! Every event name maps to exactly one [`BattleEvent`] variant with a typed
//! payload. The serialized form is `{"event": <name>, "detail": {...}}`, which
//! is also what [`super::EventBus::emit_named`] validates untyped input against.

use battle_core::{
    BattleState, ContestantPair, InterruptReason, InterruptResolution, MatchScore, RoundResult,
    Side, Trigger,
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::bus::Topic;
use crate::timer::TimerCategory;

/// Typed battle event. One variant per event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::EnumDiscriminants)]
#[strum_discriminants(name(EventKind), derive(Hash, strum::EnumIter))]
#[serde(tag = "event", content = "detail")]
pub enum BattleEvent {
    #[serde(rename = "control.state.changed")]
    StateChanged(StateChanged),
    #[serde(rename = "match.started")]
    MatchStarted(MatchStarted),
    #[serde(rename = "roundStarted")]
    RoundStarted(RoundStarted),
    #[serde(rename = "roundPrompt")]
    RoundPrompt(RoundPrompt),
    #[serde(rename = "countdownStarted")]
    CountdownStarted(CountdownStarted),
    #[serde(rename = "countdownTick")]
    CountdownTick(CountdownTick),
    #[serde(rename = "countdown.drift")]
    CountdownDrift(CountdownDrift),
    #[serde(rename = "statSelected")]
    StatSelected(StatSelected),
    #[serde(rename = "roundResolved")]
    RoundResolved(RoundResolved),
    #[serde(rename = "countdownFinished")]
    CountdownFinished(CountdownFinished),
    #[serde(rename = "match.concluded")]
    MatchConcluded(MatchConcluded),
    #[serde(rename = "interrupt.raised")]
    InterruptRaised(InterruptRaised),
    #[serde(rename = "interrupt.resolved")]
    InterruptResolved(InterruptResolved),
    #[serde(rename = "timer.paused")]
    TimerPaused(TimerSuspension),
    #[serde(rename = "timer.resumed")]
    TimerResumed(TimerSuspension),
}

impl BattleEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn topic(&self) -> Topic {
        self.kind().topic()
    }

    /// Round index carried by the payload, if the event is round-scoped.
    pub fn round(&self) -> Option<u32> {
        match self {
            Self::StateChanged(e) => Some(e.round),
            Self::MatchStarted(_) | Self::MatchConcluded(_) => None,
            Self::RoundStarted(e) => Some(e.round),
            Self::RoundPrompt(e) => Some(e.round),
            Self::CountdownStarted(e) => Some(e.round),
            Self::CountdownTick(e) => Some(e.round),
            Self::CountdownDrift(e) => Some(e.round),
            Self::StatSelected(e) => Some(e.round),
            Self::RoundResolved(e) => Some(e.round),
            Self::CountdownFinished(e) => Some(e.round),
            Self::InterruptRaised(e) => Some(e.round),
            Self::InterruptResolved(e) => Some(e.round),
            Self::TimerPaused(e) | Self::TimerResumed(e) => Some(e.round),
        }
    }
}

impl EventKind {
    /// Wire name of the event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateChanged => "control.state.changed",
            Self::MatchStarted => "match.started",
            Self::RoundStarted => "roundStarted",
            Self::RoundPrompt => "roundPrompt",
            Self::CountdownStarted => "countdownStarted",
            Self::CountdownTick => "countdownTick",
            Self::CountdownDrift => "countdown.drift",
            Self::StatSelected => "statSelected",
            Self::RoundResolved => "roundResolved",
            Self::CountdownFinished => "countdownFinished",
            Self::MatchConcluded => "match.concluded",
            Self::InterruptRaised => "interrupt.raised",
            Self::InterruptResolved => "interrupt.resolved",
            Self::TimerPaused => "timer.paused",
            Self::TimerResumed => "timer.resumed",
        }
    }

    pub fn from_name(name: &str) -> Option<EventKind> {
        EventKind::iter().find(|kind| kind.name() == name)
    }

    pub const fn topic(&self) -> Topic {
        match self {
            Self::StateChanged
            | Self::MatchStarted
            | Self::MatchConcluded
            | Self::InterruptRaised
            | Self::InterruptResolved => Topic::Lifecycle,
            Self::RoundStarted | Self::RoundPrompt | Self::StatSelected | Self::RoundResolved => {
                Topic::Round
            }
            Self::CountdownStarted
            | Self::CountdownTick
            | Self::CountdownDrift
            | Self::CountdownFinished
            | Self::TimerPaused
            | Self::TimerResumed => Topic::Timer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChanged {
    pub from: BattleState,
    pub to: BattleState,
    pub trigger: Trigger,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStarted {
    pub target_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStarted {
    pub round: u32,
    pub contestants: ContestantPair,
}

/// Emitted when the selection window opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPrompt {
    pub round: u32,
    /// Selectable stat keys in card order.
    pub stats: Vec<String>,
    pub remaining_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownStarted {
    pub category: TimerCategory,
    pub round: u32,
    pub duration_secs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownTick {
    pub category: TimerCategory,
    pub round: u32,
    pub remaining_secs: u32,
}

/// A tick arrived late enough that the countdown re-based its schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownDrift {
    pub category: TimerCategory,
    pub round: u32,
    pub remaining_secs: u32,
    pub lag_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSelected {
    pub round: u32,
    pub stat: String,
    /// True when the stat was picked on timeout rather than by the player.
    pub auto: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResolved {
    pub round: u32,
    pub stat: String,
    pub value_a: i32,
    pub value_b: i32,
    pub result: RoundResult,
    pub delta: i64,
    /// Score after this round.
    pub score: MatchScore,
    pub match_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownFinished {
    pub round: u32,
    /// True when the cooldown was skipped instead of running out.
    pub skipped: bool,
}

/// How a match came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MatchEnd {
    TargetReached,
    Interrupted { reason: InterruptReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConcluded {
    pub winner: Option<Side>,
    pub score: MatchScore,
    pub target_score: u32,
    pub ended_by: MatchEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptRaised {
    pub round: u32,
    pub reason: InterruptReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Renderers key their explanatory message off `reason`, never off `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptResolved {
    pub round: u32,
    pub reason: InterruptReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub resolution: InterruptResolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSuspension {
    pub round: u32,
}
