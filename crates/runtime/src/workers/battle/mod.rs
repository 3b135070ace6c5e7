//! Battle worker that owns the authoritative [`BattleState`].
//!
//! Receives commands from [`crate::BattleHandle`] and completion signals from
//! the tasks it spawns (contestant draws, opponent reveals, countdowns,
//! decision guard). Every trigger goes through [`BattleWorker::dispatch`]; a
//! trigger raised while a transition is in progress is queued and applied
//! once the current entry action has returned.

mod command;
mod entry;

pub use command::Command;
pub(crate) use command::Signal;

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use battle_core::{
    BattleError, BattleState, Contestant, ContestantPair, InterruptReason, InterruptResolution,
    InterruptScope, MatchConfig, MatchScore, RoundOutcome, Trigger,
};

use crate::api::{BattleSnapshot, ContestantSource, DrawError, SettingsProvider};
use crate::diagnostics::{DiagnosticsSink, InterruptRecord, TransitionRecord};
use crate::events::{
    BattleEvent, CountdownDrift, CountdownFinished, CountdownStarted, CountdownTick, EventBus,
    InterruptResolved, MatchStarted, RoundStarted, StateChanged, StatSelected, TimerSuspension,
};
use crate::readiness::Readiness;
use crate::runtime::RuntimeConfig;
use crate::timer::{CountdownCallbacks, TimerCategory, TimerSettings, Timers};

/// A queued trigger, with the interrupt that raised it if any.
struct Transition {
    trigger: Trigger,
    interrupt: Option<InterruptRecord>,
}

/// Result of a compared round, held until `RoundOver` publishes it.
struct Resolution {
    stat: String,
    value_a: i32,
    value_b: i32,
    outcome: RoundOutcome,
}

/// Tasks spawned for the current round.
#[derive(Default)]
struct RoundTasks {
    draw: Option<JoinHandle<()>>,
    reveal: Option<JoinHandle<()>>,
    guard: Option<JoinHandle<()>>,
}

impl RoundTasks {
    fn abort_all(&mut self) {
        for task in [self.draw.take(), self.reveal.take(), self.guard.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

/// Dependencies injected by the runtime builder.
pub(crate) struct WorkerParts {
    pub config: RuntimeConfig,
    pub source: Arc<dyn ContestantSource>,
    pub settings: Arc<dyn SettingsProvider>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
    pub event_bus: EventBus,
    pub readiness: Readiness,
}

/// Background task that runs the battle state machine.
pub struct BattleWorker {
    config: RuntimeConfig,
    match_config: MatchConfig,

    state: BattleState,
    score: MatchScore,
    round: u32,
    contestants: Option<ContestantPair>,
    selection: Option<String>,
    resolution: Option<Resolution>,
    interrupt: Option<InterruptRecord>,
    paused: bool,

    timers: Timers,
    next_generation: u64,
    tasks: RoundTasks,

    pending: VecDeque<Transition>,
    dispatching: bool,

    source: Arc<dyn ContestantSource>,
    settings: Arc<dyn SettingsProvider>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    event_bus: EventBus,
    readiness: Readiness,

    command_rx: mpsc::Receiver<Command>,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
}

impl BattleWorker {
    pub(crate) fn new(parts: WorkerParts, command_rx: mpsc::Receiver<Command>) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        info!(
            target: "runtime::battle",
            round_timer_secs = parts.config.round_timer_secs,
            cooldown_secs = parts.config.cooldown_secs,
            auto_select = %parts.config.auto_select,
            "battle worker initialized"
        );

        Self {
            config: parts.config,
            match_config: MatchConfig::default(),
            state: BattleState::WaitingForMatchStart,
            score: MatchScore::ZERO,
            round: 0,
            contestants: None,
            selection: None,
            resolution: None,
            interrupt: None,
            paused: false,
            timers: Timers::new(),
            next_generation: 0,
            tasks: RoundTasks::default(),
            pending: VecDeque::new(),
            dispatching: false,
            source: parts.source,
            settings: parts.settings,
            diagnostics: parts.diagnostics,
            event_bus: parts.event_bus,
            readiness: parts.readiness,
            command_rx,
            signal_tx,
            signal_rx,
        }
    }

    /// Main worker loop. Returns once every handle is gone or a shutdown
    /// command arrives.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(signal) = self.signal_rx.recv() => {
                    self.handle_signal(signal);
                }
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
            }
        }

        self.timers.stop_all();
        self.tasks.abort_all();
        info!(target: "runtime::battle", "battle worker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::StartMatch => self.start_match(),
            Command::SelectStat { stat, reply } => {
                let accepted = self.select_stat(stat);
                if reply.send(accepted).is_err() {
                    debug!(target: "runtime::battle", "SelectStat reply channel closed (caller dropped)");
                }
            }
            Command::SkipCooldown => self.skip_cooldown(),
            Command::Interrupt { reason, error } => self.raise_interrupt(reason, error),
            Command::ResolveInterrupt { resolution } => self.resolve_interrupt(resolution),
            Command::RestartMatch => self.dispatch(Trigger::RestartMatch),
            Command::Pause => self.set_paused(true),
            Command::Resume => self.set_paused(false),
            Command::Snapshot { reply } => {
                if reply.send(self.snapshot()).is_err() {
                    debug!(target: "runtime::battle", "Snapshot reply channel closed (caller dropped)");
                }
            }
            Command::TimerSnapshot { category, reply } => {
                if reply.send(self.timers.snapshot(category)).is_err() {
                    debug!(target: "runtime::battle", "TimerSnapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::DrawCompleted { round, result } => {
                if self.state != BattleState::RoundStart || round != self.round {
                    debug!(target: "runtime::battle", round, current = self.round, "dropping stale draw");
                    return;
                }
                self.tasks.draw = None;
                self.on_cards_drawn(result);
            }
            Signal::OpponentRevealed { round, result } => {
                if self.state != BattleState::RoundDecision || round != self.round {
                    debug!(target: "runtime::battle", round, current = self.round, "dropping stale reveal");
                    return;
                }
                self.tasks.reveal = None;
                self.on_opponent_revealed(result);
            }
            Signal::DecisionGuardExpired { round } => {
                if self.state != BattleState::RoundDecision || round != self.round {
                    return;
                }
                self.tasks.guard = None;
                warn!(
                    target: "runtime::battle",
                    round,
                    guard_ms = self.config.decision_guard.as_millis() as u64,
                    "opponent reveal did not complete in time"
                );
                let record = InterruptRecord {
                    reason: InterruptReason::PostResolveWatchdog,
                    error: Some(format!(
                        "opponent not revealed within {}ms",
                        self.config.decision_guard.as_millis()
                    )),
                    round,
                };
                self.dispatch_with(Trigger::DecisionGuardExpired, Some(record));
            }
            Signal::TimerTick {
                category,
                generation,
                remaining,
            } => {
                if self.timers.is_current(category, generation) {
                    self.event_bus.emit(BattleEvent::CountdownTick(CountdownTick {
                        category,
                        round: self.round,
                        remaining_secs: remaining,
                    }));
                }
            }
            Signal::TimerDrift {
                category,
                generation,
                remaining,
                lag,
            } => {
                if self.timers.is_current(category, generation) {
                    self.event_bus.emit(BattleEvent::CountdownDrift(CountdownDrift {
                        category,
                        round: self.round,
                        remaining_secs: remaining,
                        lag_ms: lag.as_millis() as u64,
                    }));
                }
            }
            Signal::TimerExpired {
                category,
                generation,
            } => {
                if !self.timers.is_current(category, generation) {
                    debug!(target: "runtime::battle", %category, generation, "dropping stale expiry");
                    return;
                }
                self.timers.stop(category);
                match category {
                    TimerCategory::Round => self.on_selection_timeout(),
                    TimerCategory::Cooldown => self.finish_cooldown(false),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn dispatch(&mut self, trigger: Trigger) {
        self.dispatch_with(trigger, None);
    }

    /// Applies `trigger`, or queues it when called from inside an entry action.
    fn dispatch_with(&mut self, trigger: Trigger, interrupt: Option<InterruptRecord>) {
        self.pending.push_back(Transition { trigger, interrupt });
        if self.dispatching {
            return;
        }

        self.dispatching = true;
        while let Some(transition) = self.pending.pop_front() {
            self.transition(transition);
        }
        self.dispatching = false;
    }

    fn transition(&mut self, Transition { trigger, interrupt }: Transition) {
        let from = self.state;
        let Some(to) = from.next(trigger) else {
            debug!(
                target: "runtime::battle",
                state = %from,
                %trigger,
                "trigger not valid in current state; ignored"
            );
            return;
        };

        self.leave(from);
        if interrupt.is_some() {
            self.interrupt = interrupt;
        }
        if to == BattleState::RoundStart {
            self.round += 1;
        }
        self.state = to;

        self.diagnostics.record_transition(&TransitionRecord {
            from,
            to,
            trigger,
            round: self.round,
            at: Utc::now(),
        });
        debug!(
            target: "runtime::battle",
            %from,
            %to,
            %trigger,
            round = self.round,
            "state transition"
        );
        self.event_bus.emit(BattleEvent::StateChanged(StateChanged {
            from,
            to,
            trigger,
            round: self.round,
        }));

        self.enter(to, trigger);
    }

    /// Releases whatever the state being left was waiting on.
    fn leave(&mut self, from: BattleState) {
        match from {
            BattleState::RoundStart => {
                if let Some(task) = self.tasks.draw.take() {
                    task.abort();
                }
            }
            BattleState::WaitingForPlayerAction => self.timers.stop(TimerCategory::Round),
            BattleState::RoundDecision => {
                for task in [self.tasks.reveal.take(), self.tasks.guard.take()]
                    .into_iter()
                    .flatten()
                {
                    task.abort();
                }
            }
            BattleState::RoundOver => self.timers.stop(TimerCategory::Cooldown),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Host input
    // ------------------------------------------------------------------

    fn start_match(&mut self) {
        if self.state != BattleState::WaitingForMatchStart {
            debug!(target: "runtime::battle", state = %self.state, "start ignored; match already running");
            return;
        }

        let (match_config, fallback) = MatchConfig::from_setting(self.settings.target_score());
        if let Some(error) = fallback {
            warn!(
                target: "runtime::battle",
                %error,
                code = error.error_code(),
                severity = error.severity().as_str(),
                target_score = match_config.target_score,
                "invalid points-to-win setting; using default"
            );
        }
        self.match_config = match_config;
        self.score.reset();
        self.round = 0;

        info!(
            target: "runtime::battle",
            target_score = match_config.target_score,
            "match started"
        );
        self.event_bus.emit(BattleEvent::MatchStarted(MatchStarted {
            target_score: match_config.target_score,
        }));
        self.dispatch(Trigger::StartClicked);
    }

    fn select_stat(&mut self, stat: String) -> bool {
        if self.state != BattleState::WaitingForPlayerAction {
            debug!(target: "runtime::battle", state = %self.state, %stat, "selection ignored");
            return false;
        }

        let known = self
            .contestants
            .as_ref()
            .is_some_and(|pair| pair.a.has_stat(&stat));
        if !known {
            debug!(target: "runtime::battle", %stat, "selection ignored; stat not on card");
            return false;
        }

        self.commit_selection(stat, false, Trigger::StatSelected);
        true
    }

    fn on_selection_timeout(&mut self) {
        if self.state != BattleState::WaitingForPlayerAction {
            return;
        }

        let choice = self
            .contestants
            .as_ref()
            .and_then(|pair| self.config.auto_select.choose(&pair.a, self.round));

        match choice {
            Some(stat) => {
                info!(
                    target: "runtime::battle",
                    round = self.round,
                    %stat,
                    "selection window expired; auto-selecting"
                );
                self.commit_selection(stat, true, Trigger::TimerExpired);
            }
            None => self.raise_interrupt(
                InterruptReason::RoundResolveError,
                Some("no stat available for auto-selection".to_string()),
            ),
        }
    }

    fn commit_selection(&mut self, stat: String, auto: bool, trigger: Trigger) {
        self.selection = Some(stat.clone());
        self.event_bus.emit(BattleEvent::StatSelected(StatSelected {
            round: self.round,
            stat,
            auto,
        }));
        self.dispatch(trigger);
    }

    fn skip_cooldown(&mut self) {
        if self.state != BattleState::RoundOver || !self.timers.is_active(TimerCategory::Cooldown) {
            debug!(target: "runtime::battle", state = %self.state, "skip ignored; no cooldown running");
            return;
        }
        self.timers.stop(TimerCategory::Cooldown);
        self.finish_cooldown(true);
    }

    fn finish_cooldown(&mut self, skipped: bool) {
        if self.state != BattleState::RoundOver {
            return;
        }
        self.event_bus
            .emit(BattleEvent::CountdownFinished(CountdownFinished {
                round: self.round,
                skipped,
            }));
        self.dispatch(Trigger::CooldownFinished);
    }

    fn raise_interrupt(&mut self, reason: InterruptReason, error: Option<String>) {
        let trigger = match reason.scope() {
            InterruptScope::Round => Trigger::Interrupt,
            InterruptScope::Match => Trigger::InterruptMatch,
        };
        let record = InterruptRecord {
            reason,
            error,
            round: self.round,
        };
        self.dispatch_with(trigger, Some(record));
    }

    fn resolve_interrupt(&mut self, resolution: InterruptResolution) {
        if self.state != BattleState::InterruptRound {
            debug!(target: "runtime::battle", state = %self.state, ?resolution, "no interrupt to resolve");
            return;
        }

        let (reason, error) = self
            .interrupt
            .as_ref()
            .map(|record| (record.reason, record.error.clone()))
            .unwrap_or((InterruptReason::RoundResolveError, None));

        info!(target: "runtime::battle", %reason, ?resolution, "interrupt resolved");
        self.event_bus
            .emit(BattleEvent::InterruptResolved(InterruptResolved {
                round: self.round,
                reason,
                error,
                resolution,
            }));
        self.dispatch(resolution.trigger());
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;

        let suspension = TimerSuspension { round: self.round };
        if paused {
            self.timers.pause_all();
            self.event_bus.emit(BattleEvent::TimerPaused(suspension));
        } else {
            self.timers.resume_all();
            self.event_bus.emit(BattleEvent::TimerResumed(suspension));
        }
    }

    fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            state: self.state,
            score: self.score,
            round: self.round,
            target_score: self.match_config.target_score,
            selection: self.selection.clone(),
            last_interrupt: self.interrupt.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Async completions
    // ------------------------------------------------------------------

    fn on_cards_drawn(&mut self, result: Result<ContestantPair, DrawError>) {
        let validated = result.and_then(|pair| {
            pair.validate()?;
            Ok(pair)
        });

        let pair = match validated {
            Ok(pair) => pair,
            Err(error) => {
                let malformed = match &error {
                    DrawError::Malformed(cause) => Some(cause),
                    _ => None,
                };
                warn!(
                    target: "runtime::battle",
                    round = self.round,
                    %error,
                    code = malformed.map(|cause| cause.error_code()),
                    severity = malformed.map(|cause| cause.severity().as_str()),
                    "round start failed"
                );
                self.raise_interrupt(InterruptReason::RoundStartError, Some(error.to_string()));
                return;
            }
        };

        self.event_bus.emit(BattleEvent::RoundStarted(RoundStarted {
            round: self.round,
            contestants: pair.clone(),
        }));
        self.contestants = Some(pair);
        self.start_timer(TimerCategory::Round, self.config.round_timer_secs);
        self.dispatch(Trigger::CardsRevealed);
    }

    fn on_opponent_revealed(&mut self, result: Result<Contestant, DrawError>) {
        let compared = result.map_err(|e| e.to_string()).and_then(|opponent| {
            let (Some(pair), Some(stat)) = (&self.contestants, &self.selection) else {
                return Err("round has no contestants or selection".to_string());
            };
            let revealed = ContestantPair::new(pair.a.clone(), opponent);
            let (value_a, value_b) = revealed.values(stat).map_err(|e| e.to_string())?;
            Ok((stat.clone(), value_a, value_b))
        });

        match compared {
            Ok((stat, value_a, value_b)) => {
                let outcome = battle_core::handle_selection(
                    value_a,
                    value_b,
                    self.score,
                    self.match_config.target_score,
                );
                self.score = outcome.score;
                self.resolution = Some(Resolution {
                    stat,
                    value_a,
                    value_b,
                    outcome,
                });
                self.dispatch(Trigger::OutcomeComputed);
            }
            Err(error) => {
                warn!(target: "runtime::battle", round = self.round, %error, "round could not be resolved");
                self.raise_interrupt(InterruptReason::RoundResolveError, Some(error));
            }
        }
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    fn timer_settings(&self) -> TimerSettings {
        TimerSettings {
            tick_interval: self.config.tick_interval,
            drift_threshold: self.config.drift_threshold,
        }
    }

    fn start_timer(&mut self, category: TimerCategory, duration_secs: u32) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let tick_tx = self.signal_tx.clone();
        let drift_tx = self.signal_tx.clone();
        let expired_tx = self.signal_tx.clone();
        let callbacks = CountdownCallbacks::new(
            move |remaining| {
                let _ = tick_tx.send(Signal::TimerTick {
                    category,
                    generation,
                    remaining,
                });
            },
            move || {
                let _ = expired_tx.send(Signal::TimerExpired {
                    category,
                    generation,
                });
            },
        )
        .on_drift(move |remaining, lag| {
            let _ = drift_tx.send(Signal::TimerDrift {
                category,
                generation,
                remaining,
                lag,
            });
        });

        let settings = self.timer_settings();
        self.timers
            .start(category, generation, duration_secs, settings, callbacks);
        if self.paused {
            self.timers.pause_all();
        }

        self.event_bus
            .emit(BattleEvent::CountdownStarted(CountdownStarted {
                category,
                round: self.round,
                duration_secs,
            }));
    }

    /// Spawns `work` for the current round and reports its result through
    /// `into_signal`. A panic inside `work` is reported as a rejected draw.
    fn spawn_round_task<T, F>(
        &self,
        work: F,
        into_signal: impl FnOnce(Result<T, DrawError>) -> Signal + Send + 'static,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, DrawError>> + Send + 'static,
    {
        let signal_tx = self.signal_tx.clone();
        tokio::spawn(async move {
            // Dropping the set aborts `work` along with this task.
            let mut set = JoinSet::new();
            set.spawn(work);
            let result = match set.join_next().await {
                Some(Ok(result)) => result,
                Some(Err(error)) => Err(DrawError::Rejected(format!(
                    "contestant source failed: {error}"
                ))),
                None => Err(DrawError::Rejected("contestant source task vanished".to_string())),
            };
            let _ = signal_tx.send(into_signal(result));
        })
    }
}
