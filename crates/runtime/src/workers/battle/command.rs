use std::time::Duration;

use tokio::sync::oneshot;

use battle_core::{Contestant, ContestantPair, InterruptReason, InterruptResolution};

use crate::api::{BattleSnapshot, DrawError};
use crate::timer::{TimerCategory, TimerHandle};

/// Host commands sent through [`crate::BattleHandle`].
pub enum Command {
    StartMatch,
    /// Commit a stat; replies whether it was accepted.
    SelectStat {
        stat: String,
        reply: oneshot::Sender<bool>,
    },
    SkipCooldown,
    Interrupt {
        reason: InterruptReason,
        error: Option<String>,
    },
    ResolveInterrupt {
        resolution: InterruptResolution,
    },
    RestartMatch,
    Pause,
    Resume,
    Snapshot {
        reply: oneshot::Sender<BattleSnapshot>,
    },
    TimerSnapshot {
        category: TimerCategory,
        reply: oneshot::Sender<Option<TimerHandle>>,
    },
    Shutdown,
}

/// Completions reported back to the worker by tasks it spawned.
///
/// Each carries the round or timer generation it was issued under; the
/// worker drops signals that no longer match.
pub(crate) enum Signal {
    DrawCompleted {
        round: u32,
        result: Result<ContestantPair, DrawError>,
    },
    OpponentRevealed {
        round: u32,
        result: Result<Contestant, DrawError>,
    },
    DecisionGuardExpired {
        round: u32,
    },
    TimerTick {
        category: TimerCategory,
        generation: u64,
        remaining: u32,
    },
    TimerDrift {
        category: TimerCategory,
        generation: u64,
        remaining: u32,
        lag: Duration,
    },
    TimerExpired {
        category: TimerCategory,
        generation: u64,
    },
}
