//! Transition diagnostics.
//!
//! The battle machine reports every accepted transition and every raised
//! interrupt to a [`DiagnosticsSink`]. The default sink drops them;
//! [`TransitionLog`] keeps a bounded history for tests and debugging.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use battle_core::{BattleState, InterruptReason, Trigger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: BattleState,
    pub to: BattleState,
    pub trigger: Trigger,
    pub round: u32,
    pub at: DateTime<Utc>,
}

/// One raised interrupt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptRecord {
    pub reason: InterruptReason,
    pub error: Option<String>,
    pub round: u32,
}

pub trait DiagnosticsSink: Send + Sync {
    fn record_transition(&self, record: &TransitionRecord);

    fn record_interrupt(&self, _record: &InterruptRecord) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn record_transition(&self, _record: &TransitionRecord) {}
}

#[derive(Debug, Default)]
struct LogState {
    transitions: VecDeque<TransitionRecord>,
    interrupts: VecDeque<InterruptRecord>,
}

/// Ring buffer of the most recent transitions and interrupts.
#[derive(Debug)]
pub struct TransitionLog {
    capacity: usize,
    state: Mutex<LogState>,
}

impl TransitionLog {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LogState::default()),
        }
    }

    pub fn records(&self) -> Vec<TransitionRecord> {
        self.lock().transitions.iter().cloned().collect()
    }

    /// Visited states in order, starting with the first recorded source state.
    pub fn states(&self) -> Vec<BattleState> {
        let state = self.lock();
        let first = state.transitions.front().map(|r| r.from);
        first
            .into_iter()
            .chain(state.transitions.iter().map(|r| r.to))
            .collect()
    }

    pub fn interrupts(&self) -> Vec<InterruptRecord> {
        self.lock().interrupts.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.transitions.clear();
        state.interrupts.clear();
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for TransitionLog {
    fn record_transition(&self, record: &TransitionRecord) {
        let mut state = self.lock();
        if state.transitions.len() == self.capacity {
            state.transitions.pop_front();
        }
        state.transitions.push_back(record.clone());
    }

    fn record_interrupt(&self, record: &InterruptRecord) {
        let mut state = self.lock();
        if state.interrupts.len() == self.capacity {
            state.interrupts.pop_front();
        }
        state.interrupts.push_back(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: BattleState, to: BattleState, trigger: Trigger) -> TransitionRecord {
        TransitionRecord {
            from,
            to,
            trigger,
            round: 1,
            at: Utc::now(),
        }
    }

    #[test]
    fn log_keeps_only_the_newest_records() {
        let log = TransitionLog::with_capacity(2);
        log.record_transition(&record(
            BattleState::WaitingForMatchStart,
            BattleState::RoundStart,
            Trigger::StartClicked,
        ));
        log.record_transition(&record(
            BattleState::RoundStart,
            BattleState::WaitingForPlayerAction,
            Trigger::CardsRevealed,
        ));
        log.record_transition(&record(
            BattleState::WaitingForPlayerAction,
            BattleState::RoundDecision,
            Trigger::StatSelected,
        ));

        assert_eq!(
            log.states(),
            vec![
                BattleState::RoundStart,
                BattleState::WaitingForPlayerAction,
                BattleState::RoundDecision,
            ]
        );
    }
}
