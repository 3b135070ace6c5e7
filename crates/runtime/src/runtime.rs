//! High-level runtime orchestrator.
//!
//! The runtime owns the battle worker, wires up the command channel, event bus
//! and readiness gates, and exposes a builder-based API for hosts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::api::{
    BattleHandle, ContestantSource, FixedSettings, Result, RuntimeError, SettingsProvider,
};
use crate::diagnostics::{DiagnosticsSink, NoopDiagnostics};
use crate::events::{BattleEvent, EventBus};
use crate::readiness::Readiness;
use crate::selection::AutoSelectPolicy;
use crate::workers::{BattleWorker, Command, WorkerParts};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Length of the stat selection window, in seconds.
    pub round_timer_secs: u32,
    /// Pause between rounds, in seconds.
    pub cooldown_secs: u32,
    pub tick_interval: Duration,
    /// How long the opponent reveal may take before the round is voided.
    pub decision_guard: Duration,
    pub drift_threshold: Duration,
    /// Go straight to the next round after a resolution.
    pub skip_cooldown: bool,
    pub auto_select: AutoSelectPolicy,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_ROUND_TIMER_SECS: u32 = 30;
    pub const DEFAULT_COOLDOWN_SECS: u32 = 3;
    pub const DEFAULT_DECISION_GUARD: Duration = Duration::from_millis(1_500);
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            round_timer_secs: Self::DEFAULT_ROUND_TIMER_SECS,
            cooldown_secs: Self::DEFAULT_COOLDOWN_SECS,
            tick_interval: Duration::from_secs(1),
            decision_guard: Self::DEFAULT_DECISION_GUARD,
            drift_threshold: Duration::from_secs(2),
            skip_cooldown: false,
            auto_select: AutoSelectPolicy::default(),
            event_buffer_size: 256,
            command_buffer_size: 64,
        }
    }
}

/// Main runtime that hosts one battle.
///
/// Design: Runtime owns the worker task.
/// [`BattleHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: BattleHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> BattleHandle {
        self.handle.clone()
    }

    /// Subscribe to battle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<BattleEvent> {
        self.handle.subscribe()
    }

    /// Stops the worker and waits for it to exit. Timers and in-flight
    /// contestant requests are cancelled.
    pub async fn shutdown(self) -> Result<()> {
        // A worker that already exited has nothing left to stop.
        let _ = self.handle.shutdown().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    source: Option<Arc<dyn ContestantSource>>,
    settings: Arc<dyn SettingsProvider>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    event_bus: Option<EventBus>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            source: None,
            settings: Arc::new(FixedSettings::unset()),
            diagnostics: Arc::new(NoopDiagnostics),
            event_bus: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required contestant source
    pub fn contestant_source(mut self, source: impl ContestantSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Set the contestant source from a shared handle
    pub fn shared_contestant_source(mut self, source: Arc<dyn ContestantSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the points-to-win provider (optional, falls back to the default target)
    pub fn settings(mut self, settings: impl SettingsProvider + 'static) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Set a diagnostics sink for transition records (optional)
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Use an existing event bus, e.g. one with renderers already attached
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build the runtime and spawn its worker
    pub async fn build(self) -> Result<Runtime> {
        let source = self.source.ok_or(RuntimeError::MissingContestantSource)?;

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let readiness = Readiness::attach(&event_bus);

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let handle = BattleHandle::new(command_tx, event_bus.clone(), readiness.clone());

        let worker = BattleWorker::new(
            WorkerParts {
                config: self.config,
                source,
                settings: self.settings,
                diagnostics: self.diagnostics,
                event_bus,
                readiness,
            },
            command_rx,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}
