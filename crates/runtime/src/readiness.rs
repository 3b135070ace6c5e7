//! Awaitable gates for battle milestones.
//!
//! A gate obtained from [`Readiness`] resolves on the next occurrence of its
//! milestone after the gate was handed out. Once resolved, further calls for
//! the same milestone hand out a fresh gate that waits for the following
//! occurrence. [`Readiness::reset_promises`] abandons every outstanding gate
//! with [`ReadinessError::Superseded`].

use std::collections::HashMap;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::events::{BattleEvent, EventBus, EventKind};

/// Milestones hosts and tests can wait on.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, strum::EnumIter)]
#[serde(rename_all = "camelCase")]
pub enum Milestone {
    RoundStarted,
    RoundPrompt,
    RoundResolved,
    CooldownFinished,
    MatchConcluded,
}

impl Milestone {
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::RoundStarted => EventKind::RoundStarted,
            Self::RoundPrompt => EventKind::RoundPrompt,
            Self::RoundResolved => EventKind::RoundResolved,
            Self::CooldownFinished => EventKind::CountdownFinished,
            Self::MatchConcluded => EventKind::MatchConcluded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadinessError {
    #[error("readiness gate was reset before its milestone occurred")]
    Superseded,
}

type Gate = watch::Sender<Option<BattleEvent>>;

/// Registry of pending milestone gates. Cheap to clone.
#[derive(Clone, Default)]
pub struct Readiness {
    gates: Arc<Mutex<HashMap<Milestone, Gate>>>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose gates resolve from `bus`.
    pub fn attach(bus: &EventBus) -> Self {
        let readiness = Self::new();
        readiness.attach_to(bus);
        readiness
    }

    /// Registers this registry's milestone listeners on `bus`. Pending gates
    /// are kept, so this re-wires a registry after [`EventBus::reset`].
    pub fn attach_to(&self, bus: &EventBus) {
        for milestone in <Milestone as strum::IntoEnumIterator>::iter() {
            let gates = self.clone();
            bus.on(milestone.kind(), move |event| {
                gates.resolve(milestone, event.clone())
            });
        }
    }

    /// Gate for the next occurrence of `milestone`.
    pub fn gate(&self, milestone: Milestone) -> ReadinessWait {
        let mut gates = self.lock();
        let rx = gates
            .entry(milestone)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        ReadinessWait { milestone, rx }
    }

    pub fn round_started(&self) -> ReadinessWait {
        self.gate(Milestone::RoundStarted)
    }

    pub fn round_prompt(&self) -> ReadinessWait {
        self.gate(Milestone::RoundPrompt)
    }

    pub fn round_resolved(&self) -> ReadinessWait {
        self.gate(Milestone::RoundResolved)
    }

    pub fn cooldown_finished(&self) -> ReadinessWait {
        self.gate(Milestone::CooldownFinished)
    }

    pub fn match_concluded(&self) -> ReadinessWait {
        self.gate(Milestone::MatchConcluded)
    }

    /// Resolves every gate handed out for `milestone` with `event`.
    pub fn resolve(&self, milestone: Milestone, event: BattleEvent) {
        let resolved = self.lock().remove(&milestone);
        if let Some(gate) = resolved {
            gate.send_replace(Some(event));
        }
    }

    /// Abandons all outstanding gates.
    pub fn reset_promises(&self) {
        let abandoned: Vec<Gate> = self.lock().drain().map(|(_, gate)| gate).collect();
        tracing::debug!(
            target: "runtime::readiness",
            abandoned = abandoned.len(),
            "readiness gates reset"
        );
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Milestone, Gate>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pending wait for one milestone occurrence. Await it directly.
pub struct ReadinessWait {
    milestone: Milestone,
    rx: watch::Receiver<Option<BattleEvent>>,
}

impl ReadinessWait {
    pub fn milestone(&self) -> Milestone {
        self.milestone
    }

    pub async fn wait(mut self) -> Result<BattleEvent, ReadinessError> {
        // The gate sender publishes its value before it is dropped, so a
        // closed channel without a value means the gate was reset.
        match self.rx.wait_for(Option::is_some).await {
            Ok(event) => event.clone().ok_or(ReadinessError::Superseded),
            Err(_) => Err(ReadinessError::Superseded),
        }
    }
}

impl IntoFuture for ReadinessWait {
    type Output = Result<BattleEvent, ReadinessError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CountdownFinished, TimerSuspension};

    fn finished(round: u32) -> BattleEvent {
        BattleEvent::CountdownFinished(CountdownFinished {
            round,
            skipped: true,
        })
    }

    #[tokio::test]
    async fn gate_resolves_on_next_occurrence() {
        let bus = EventBus::new();
        let readiness = Readiness::attach(&bus);

        let wait = readiness.cooldown_finished();
        bus.emit(BattleEvent::TimerPaused(TimerSuspension { round: 1 }));
        bus.emit(finished(1));

        assert_eq!(wait.await, Ok(finished(1)));
    }

    #[tokio::test]
    async fn gates_after_resolution_wait_for_the_following_occurrence() {
        let bus = EventBus::new();
        let readiness = Readiness::attach(&bus);

        let first = readiness.cooldown_finished();
        bus.emit(finished(1));
        let second = readiness.cooldown_finished();
        bus.emit(finished(2));

        assert_eq!(first.await, Ok(finished(1)));
        assert_eq!(second.await, Ok(finished(2)));
    }

    #[tokio::test]
    async fn reset_supersedes_outstanding_gates() {
        let bus = EventBus::new();
        let readiness = Readiness::attach(&bus);

        let stale = readiness.cooldown_finished();
        readiness.reset_promises();
        let fresh = readiness.cooldown_finished();
        bus.emit(finished(3));

        assert_eq!(stale.await, Err(ReadinessError::Superseded));
        assert_eq!(fresh.await, Ok(finished(3)));
    }

    #[tokio::test]
    async fn reattached_registry_resolves_after_bus_reset() {
        let bus = EventBus::new();
        let readiness = Readiness::attach(&bus);

        let pending = readiness.cooldown_finished();
        bus.reset();
        bus.emit(finished(1));
        readiness.attach_to(&bus);
        bus.emit(finished(2));

        assert_eq!(pending.await, Ok(finished(2)));
    }
}
