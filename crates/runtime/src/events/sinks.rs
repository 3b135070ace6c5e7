//! Listeners that turn bus events into host-visible output.

use std::sync::{Arc, Mutex, PoisonError};

use battle_core::{InterruptReason, MatchScore, RoundResult};
use strum::IntoEnumIterator;

use super::bus::EventBus;
use super::types::{BattleEvent, EventKind, MatchEnd};

/// What a renderer currently shows for the active round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundView {
    pub round: u32,
    pub stats: Vec<String>,
    pub remaining_secs: Option<u32>,
    pub selected: Option<String>,
    pub result: Option<RoundResult>,
    pub score: MatchScore,
    /// Events dropped because they belonged to an earlier round.
    pub stale_dropped: u64,
}

/// Keeps a [`RoundView`] current and drops events from rounds that have
/// already been superseded.
#[derive(Clone, Default)]
pub struct RoundTracker {
    view: Arc<Mutex<RoundView>>,
}

impl RoundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, bus: &EventBus) {
        for kind in [
            EventKind::RoundStarted,
            EventKind::RoundPrompt,
            EventKind::CountdownTick,
            EventKind::StatSelected,
            EventKind::RoundResolved,
        ] {
            let tracker = self.clone();
            bus.on(kind, move |event| tracker.observe(event));
        }
    }

    pub fn observe(&self, event: &BattleEvent) {
        let Some(round) = event.round() else {
            return;
        };

        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        if round < view.round {
            view.stale_dropped += 1;
            tracing::debug!(
                target: "runtime::render",
                event = event.name(),
                round,
                current = view.round,
                "dropping stale round event"
            );
            return;
        }

        if round > view.round {
            *view = RoundView {
                round,
                score: view.score,
                stale_dropped: view.stale_dropped,
                ..RoundView::default()
            };
        }

        match event {
            BattleEvent::RoundPrompt(prompt) => {
                view.stats = prompt.stats.clone();
                view.remaining_secs = Some(prompt.remaining_secs);
            }
            BattleEvent::CountdownTick(tick) => view.remaining_secs = Some(tick.remaining_secs),
            BattleEvent::StatSelected(selected) => view.selected = Some(selected.stat.clone()),
            BattleEvent::RoundResolved(resolved) => {
                view.result = Some(resolved.result);
                view.score = resolved.score;
            }
            _ => {}
        }
    }

    pub fn view(&self) -> RoundView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// User-facing message for an interrupt. Keyed on the reason only; the
/// attached error text is for logs.
pub fn interrupt_message(reason: InterruptReason) -> &'static str {
    match reason {
        InterruptReason::RoundStartError => "Could not deal the next cards.",
        InterruptReason::RoundResolveError => "The round could not be scored.",
        InterruptReason::PostResolveWatchdog => "The opponent took too long; replaying the round.",
        InterruptReason::Quit => "Match abandoned.",
    }
}

/// Renders every event as a structured log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRenderSink;

impl TracingRenderSink {
    pub fn attach(self, bus: &EventBus) {
        for kind in EventKind::iter() {
            bus.on(kind, move |event| self.render(event));
        }
    }

    pub fn render(&self, event: &BattleEvent) {
        match event {
            BattleEvent::StateChanged(e) => tracing::debug!(
                target: "runtime::render",
                from = %e.from,
                to = %e.to,
                trigger = %e.trigger,
                round = e.round,
                "state changed"
            ),
            BattleEvent::MatchStarted(e) => tracing::info!(
                target: "runtime::render",
                target_score = e.target_score,
                "match started"
            ),
            BattleEvent::RoundStarted(e) => tracing::info!(
                target: "runtime::render",
                round = e.round,
                player = %e.contestants.a.name,
                opponent = %e.contestants.b.name,
                "round started"
            ),
            BattleEvent::RoundPrompt(e) => tracing::info!(
                target: "runtime::render",
                round = e.round,
                stats = ?e.stats,
                remaining_secs = e.remaining_secs,
                "choose a stat"
            ),
            BattleEvent::CountdownStarted(e) => tracing::debug!(
                target: "runtime::render",
                category = %e.category,
                round = e.round,
                duration_secs = e.duration_secs,
                "countdown started"
            ),
            BattleEvent::CountdownTick(e) => tracing::trace!(
                target: "runtime::render",
                category = %e.category,
                remaining_secs = e.remaining_secs,
                "tick"
            ),
            BattleEvent::CountdownDrift(e) => tracing::debug!(
                target: "runtime::render",
                category = %e.category,
                lag_ms = e.lag_ms,
                "countdown drift"
            ),
            BattleEvent::StatSelected(e) => tracing::info!(
                target: "runtime::render",
                round = e.round,
                stat = %e.stat,
                auto = e.auto,
                "stat selected"
            ),
            BattleEvent::RoundResolved(e) => tracing::info!(
                target: "runtime::render",
                round = e.round,
                stat = %e.stat,
                value_a = e.value_a,
                value_b = e.value_b,
                result = %e.result,
                score_a = e.score.a,
                score_b = e.score.b,
                "round resolved"
            ),
            BattleEvent::CountdownFinished(e) => tracing::debug!(
                target: "runtime::render",
                round = e.round,
                skipped = e.skipped,
                "cooldown finished"
            ),
            BattleEvent::MatchConcluded(e) => {
                let ended_by = match e.ended_by {
                    MatchEnd::TargetReached => "target reached",
                    MatchEnd::Interrupted { reason } => interrupt_message(reason),
                };
                tracing::info!(
                    target: "runtime::render",
                    winner = ?e.winner,
                    score_a = e.score.a,
                    score_b = e.score.b,
                    ended_by,
                    "match concluded"
                );
            }
            BattleEvent::InterruptRaised(e) => tracing::warn!(
                target: "runtime::render",
                round = e.round,
                reason = %e.reason,
                error = e.error.as_deref().unwrap_or(""),
                "{}",
                interrupt_message(e.reason)
            ),
            BattleEvent::InterruptResolved(e) => tracing::info!(
                target: "runtime::render",
                round = e.round,
                reason = %e.reason,
                resolution = ?e.resolution,
                "interrupt resolved"
            ),
            BattleEvent::TimerPaused(e) => {
                tracing::info!(target: "runtime::render", round = e.round, "paused")
            }
            BattleEvent::TimerResumed(e) => {
                tracing::info!(target: "runtime::render", round = e.round, "resumed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RoundPrompt, RoundStarted, StatSelected};
    use battle_core::{Contestant, ContestantPair, Stat};

    fn prompt(round: u32) -> BattleEvent {
        BattleEvent::RoundPrompt(RoundPrompt {
            round,
            stats: vec!["power".into()],
            remaining_secs: 30,
        })
    }

    fn started(round: u32) -> BattleEvent {
        let card = |id: &str| Contestant::new(id, id, vec![Stat::new("power", 1)]);
        BattleEvent::RoundStarted(RoundStarted {
            round,
            contestants: ContestantPair::new(card("a"), card("b")),
        })
    }

    #[test]
    fn out_of_order_round_starts_keep_the_newest_round() {
        let tracker = RoundTracker::new();

        tracker.observe(&started(3));
        assert_eq!(tracker.view().round, 3);
        tracker.observe(&started(2));
        assert_eq!(tracker.view().round, 3);
        tracker.observe(&started(4));
        assert_eq!(tracker.view().round, 4);

        assert_eq!(tracker.view().stale_dropped, 1);
    }

    #[test]
    fn stale_round_events_are_ignored() {
        let bus = EventBus::new();
        let tracker = RoundTracker::new();
        tracker.attach(&bus);

        bus.emit(prompt(2));
        bus.emit(BattleEvent::StatSelected(StatSelected {
            round: 1,
            stat: "power".into(),
            auto: true,
        }));

        let view = tracker.view();
        assert_eq!(view.round, 2);
        assert_eq!(view.selected, None);
        assert_eq!(view.stale_dropped, 1);
    }

    #[test]
    fn new_round_clears_previous_selection() {
        let tracker = RoundTracker::new();
        tracker.observe(&prompt(1));
        tracker.observe(&BattleEvent::StatSelected(StatSelected {
            round: 1,
            stat: "power".into(),
            auto: false,
        }));
        tracker.observe(&prompt(2));

        assert_eq!(tracker.view().selected, None);
        assert_eq!(tracker.view().round, 2);
    }
}
