//! Cloneable façade for driving a battle.
//!
//! [`BattleHandle`] hides channel plumbing and offers async helpers for host
//! input, interrupt handling and state queries. Inputs are queued behind any
//! transition already in progress and applied in the order they were sent.
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::{BattleState, InterruptReason, InterruptResolution, MatchScore};

use super::errors::{Result, RuntimeError};
use crate::diagnostics::InterruptRecord;
use crate::events::{BattleEvent, EventBus, EventStream, Topic};
use crate::readiness::Readiness;
use crate::timer::{TimerCategory, TimerHandle};
use crate::workers::Command;

/// Read-only view of the battle machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub state: BattleState,
    pub score: MatchScore,
    pub round: u32,
    pub target_score: u32,
    /// Stat committed for the current round, if any.
    pub selection: Option<String>,
    pub last_interrupt: Option<InterruptRecord>,
}

/// Client-facing handle to a running battle
#[derive(Clone)]
pub struct BattleHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    readiness: Readiness,
}

impl BattleHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        readiness: Readiness,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            readiness,
        }
    }

    /// Starts a match. Ignored unless the machine is waiting for one.
    pub async fn start_match(&self) -> Result<()> {
        self.send(Command::StartMatch).await
    }

    /// Commits the player's stat for the current round.
    ///
    /// Returns `false` when the selection was ignored: the machine was not
    /// waiting for player input, or the stat is not on the player's card.
    pub async fn submit_selection(&self, stat: impl Into<String>) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::SelectStat {
            stat: stat.into(),
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Ends the inter-round cooldown early.
    pub async fn skip_cooldown(&self) -> Result<()> {
        self.send(Command::SkipCooldown).await
    }

    /// Raises an interrupt. [`InterruptReason::Quit`] ends the match; other
    /// reasons void the current round.
    pub async fn interrupt(&self, reason: InterruptReason, error: Option<String>) -> Result<()> {
        self.send(Command::Interrupt { reason, error }).await
    }

    pub async fn quit(&self) -> Result<()> {
        self.interrupt(InterruptReason::Quit, None).await
    }

    /// Leaves a pending round interrupt.
    pub async fn resolve_interrupt(&self, resolution: InterruptResolution) -> Result<()> {
        self.send(Command::ResolveInterrupt { resolution }).await
    }

    /// Returns a finished match to the waiting state with a zero score.
    pub async fn restart_match(&self) -> Result<()> {
        self.send(Command::RestartMatch).await
    }

    /// Suspends all running countdowns.
    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    /// Query the current machine state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<BattleSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::Snapshot { reply: reply_tx }).await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Query the countdown of `category`, if one is running
    pub async fn timer(&self, category: TimerCategory) -> Result<Option<TimerHandle>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send(Command::TimerSnapshot {
            category,
            reply: reply_tx,
        })
        .await?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to every battle event
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.event_bus.subscribe()
    }

    /// Subscribe to events of specific topics
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut rounds = handle.subscribe_topics(&[Topic::Round]);
    /// while let Ok(event) = rounds.recv().await {
    ///     // Render round events
    /// }
    /// ```
    pub fn subscribe_topics(&self, topics: &[Topic]) -> EventStream {
        self.event_bus.subscribe_topics(topics)
    }

    /// Get a reference to the event bus for registering listeners
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Milestone gates fed by this battle's event bus
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Drops every listener registered on the event bus, then re-wires the
    /// milestone gates so [`Self::readiness`] keeps resolving.
    pub fn reset_listeners(&self) {
        self.event_bus.reset();
        self.readiness.attach_to(&self.event_bus);
    }

    pub(crate) async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}
