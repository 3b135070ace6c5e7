//! Entry actions, run once each time a state is entered.
//!
//! Entry actions never block: anything asynchronous is spawned and reports
//! back as a [`Signal`]. Triggers dispatched from here are queued behind the
//! transition that is currently being applied.

use std::sync::Arc;

use tokio::time;
use tracing::{info, warn};

use battle_core::{BattleState, InterruptReason, InterruptResolution, Trigger, match_winner};

use super::{BattleWorker, Signal};
use crate::events::{
    BattleEvent, CountdownFinished, InterruptRaised, InterruptResolved, MatchConcluded, MatchEnd,
    RoundPrompt, RoundResolved,
};
use crate::timer::TimerCategory;

impl BattleWorker {
    pub(super) fn enter(&mut self, state: BattleState, trigger: Trigger) {
        match state {
            BattleState::WaitingForMatchStart => self.enter_waiting_for_match(),
            BattleState::RoundStart => self.enter_round_start(),
            BattleState::WaitingForPlayerAction => self.enter_waiting_for_player(),
            BattleState::RoundDecision => self.enter_round_decision(),
            BattleState::RoundOver => self.enter_round_over(),
            BattleState::MatchOver => self.enter_match_over(trigger),
            BattleState::InterruptRound => self.enter_interrupt_round(),
            BattleState::InterruptMatch => self.enter_interrupt_match(),
        }
    }

    fn enter_waiting_for_match(&mut self) {
        self.timers.stop_all();
        self.tasks.abort_all();
        self.score.reset();
        self.round = 0;
        self.contestants = None;
        self.selection = None;
        self.resolution = None;
        self.interrupt = None;
        self.readiness.reset_promises();

        info!(target: "runtime::battle", "match reset; waiting for start");
    }

    fn enter_round_start(&mut self) {
        self.timers.stop_all();
        self.contestants = None;
        self.selection = None;
        self.resolution = None;

        let round = self.round;
        let source = Arc::clone(&self.source);
        self.tasks.draw = Some(self.spawn_round_task(
            async move { source.draw_contestants(round).await },
            move |result| Signal::DrawCompleted { round, result },
        ));
    }

    fn enter_waiting_for_player(&mut self) {
        let stats = self
            .contestants
            .as_ref()
            .map(|pair| pair.a.stat_keys().map(str::to_string).collect())
            .unwrap_or_default();
        let remaining_secs = self
            .timers
            .snapshot(TimerCategory::Round)
            .map_or(self.config.round_timer_secs, |timer| timer.remaining_secs);

        self.event_bus.emit(BattleEvent::RoundPrompt(RoundPrompt {
            round: self.round,
            stats,
            remaining_secs,
        }));
    }

    fn enter_round_decision(&mut self) {
        let round = self.round;

        let guard = self.config.decision_guard;
        let guard_tx = self.signal_tx.clone();
        self.tasks.guard = Some(tokio::spawn(async move {
            time::sleep(guard).await;
            let _ = guard_tx.send(Signal::DecisionGuardExpired { round });
        }));

        let Some(drawn) = self.contestants.as_ref().map(|pair| pair.b.clone()) else {
            // Without a drawn opponent the guard will interrupt the round.
            warn!(target: "runtime::battle", round, "round decision without contestants");
            return;
        };
        let source = Arc::clone(&self.source);
        self.tasks.reveal = Some(self.spawn_round_task(
            async move { source.reveal_opponent(round, &drawn).await },
            move |result| Signal::OpponentRevealed { round, result },
        ));
    }

    fn enter_round_over(&mut self) {
        let Some(resolution) = self.resolution.take() else {
            warn!(target: "runtime::battle", round = self.round, "round over without a resolution");
            return;
        };
        let match_ended = resolution.outcome.match_ended;

        self.event_bus.emit(BattleEvent::RoundResolved(RoundResolved {
            round: self.round,
            stat: resolution.stat,
            value_a: resolution.value_a,
            value_b: resolution.value_b,
            result: resolution.outcome.result,
            delta: resolution.outcome.delta,
            score: self.score,
            match_ended,
        }));

        if match_ended {
            self.dispatch(Trigger::MatchEnded);
        } else if self.config.skip_cooldown {
            self.event_bus
                .emit(BattleEvent::CountdownFinished(CountdownFinished {
                    round: self.round,
                    skipped: true,
                }));
            self.dispatch(Trigger::CooldownFinished);
        } else {
            self.start_timer(TimerCategory::Cooldown, self.config.cooldown_secs);
        }
    }

    fn enter_match_over(&mut self, trigger: Trigger) {
        self.timers.stop_all();
        self.tasks.abort_all();

        let ended_by = match (trigger, &self.interrupt) {
            (Trigger::ConcludeMatch, Some(record)) => MatchEnd::Interrupted {
                reason: record.reason,
            },
            _ => MatchEnd::TargetReached,
        };
        self.conclude(ended_by);
    }

    fn enter_interrupt_round(&mut self) {
        self.timers.stop_all();
        self.tasks.abort_all();

        let Some(record) = self.interrupt.clone() else {
            warn!(target: "runtime::battle", round = self.round, "round interrupt without a reason");
            return;
        };
        self.diagnostics.record_interrupt(&record);

        warn!(
            target: "runtime::battle",
            round = record.round,
            reason = %record.reason,
            error = record.error.as_deref().unwrap_or(""),
            "round interrupted"
        );
        self.event_bus
            .emit(BattleEvent::InterruptRaised(InterruptRaised {
                round: self.round,
                reason: record.reason,
                error: record.error,
            }));

        if let Some(resolution) = record.reason.auto_resolution() {
            self.resolve_interrupt(resolution);
        }
    }

    fn enter_interrupt_match(&mut self) {
        self.timers.stop_all();
        self.tasks.abort_all();

        let reason = self
            .interrupt
            .as_ref()
            .map_or(InterruptReason::Quit, |record| record.reason);
        let error = self.interrupt.as_ref().and_then(|record| record.error.clone());
        if let Some(record) = &self.interrupt {
            self.diagnostics.record_interrupt(record);
        }

        info!(target: "runtime::battle", round = self.round, %reason, "match interrupted");
        self.event_bus
            .emit(BattleEvent::InterruptRaised(InterruptRaised {
                round: self.round,
                reason,
                error: error.clone(),
            }));
        self.event_bus
            .emit(BattleEvent::InterruptResolved(InterruptResolved {
                round: self.round,
                reason,
                error,
                resolution: InterruptResolution::ConcludeMatch,
            }));
        self.conclude(MatchEnd::Interrupted { reason });
    }

    /// Publishes the end of the match. A match cut short goes to whoever
    /// leads; a tie has no winner.
    fn conclude(&mut self, ended_by: MatchEnd) {
        let target_score = self.match_config.target_score;
        let winner = match ended_by {
            MatchEnd::TargetReached => match_winner(self.score, target_score),
            MatchEnd::Interrupted { .. } => self.score.leader(),
        };

        info!(
            target: "runtime::battle",
            winner = ?winner,
            score_a = self.score.a,
            score_b = self.score.b,
            target_score,
            "match concluded"
        );
        self.event_bus
            .emit(BattleEvent::MatchConcluded(MatchConcluded {
                winner,
                score: self.score,
                target_score,
                ended_by,
            }));
    }
}
