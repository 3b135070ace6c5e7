//! Headless player that drives a match through the handle.
use std::time::Duration;

use anyhow::{Context, Result, bail};
use battle_core::{Contestant, InterruptReason, InterruptResolution};
use runtime::events::MatchConcluded;
use runtime::{AutoSelectPolicy, BattleEvent, BattleHandle, Topic};
use tokio::sync::broadcast::error::RecvError;

/// Plays matches on behalf of a human: answers every prompt after a think
/// delay and retries rounds that failed to deal.
pub struct SimulatedPlayer {
    handle: BattleHandle,
    policy: AutoSelectPolicy,
    delay: Duration,
    max_retries: u32,
}

impl SimulatedPlayer {
    pub fn new(handle: BattleHandle, policy: AutoSelectPolicy, delay: Duration) -> Self {
        Self {
            handle,
            policy,
            delay,
            max_retries: 3,
        }
    }

    /// Consecutive failed rounds retried before the match is concluded.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Starts a match and plays it to its conclusion.
    pub async fn play_match(&self) -> Result<MatchConcluded> {
        let mut events = self
            .handle
            .subscribe_topics(&[Topic::Lifecycle, Topic::Round]);
        self.handle
            .start_match()
            .await
            .context("failed to start match")?;

        let mut card: Option<Contestant> = None;
        let mut retries = 0;

        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "player fell behind the event stream");
                    continue;
                }
                Err(RecvError::Closed) => bail!("runtime stopped before the match concluded"),
            };

            match event {
                BattleEvent::RoundStarted(started) => {
                    card = Some(started.contestants.a);
                }
                BattleEvent::RoundPrompt(prompt) => {
                    let stat = card
                        .as_ref()
                        .and_then(|card| self.policy.choose(card, prompt.round))
                        .or_else(|| prompt.stats.first().cloned());
                    let Some(stat) = stat else {
                        continue;
                    };

                    tokio::time::sleep(self.delay).await;
                    let accepted = self
                        .handle
                        .submit_selection(stat.clone())
                        .await
                        .context("failed to submit selection")?;
                    if !accepted {
                        tracing::debug!(round = prompt.round, %stat, "selection window already closed");
                    }
                }
                BattleEvent::RoundResolved(_) => retries = 0,
                BattleEvent::InterruptRaised(raised) => match raised.reason {
                    InterruptReason::PostResolveWatchdog | InterruptReason::Quit => {}
                    InterruptReason::RoundStartError | InterruptReason::RoundResolveError => {
                        retries += 1;
                        let resolution = if retries > self.max_retries {
                            InterruptResolution::ConcludeMatch
                        } else {
                            InterruptResolution::RetryRound
                        };
                        tracing::info!(reason = %raised.reason, retries, ?resolution, "resolving interrupt");
                        self.handle
                            .resolve_interrupt(resolution)
                            .await
                            .context("failed to resolve interrupt")?;
                    }
                },
                BattleEvent::MatchConcluded(concluded) => return Ok(concluded),
                _ => {}
            }
        }
    }
}
