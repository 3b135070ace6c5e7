//! Name-keyed event bus with synchronous listeners and async subscribers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

use super::types::{BattleEvent, EventKind};

/// Topics for async event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// State transitions, match start/end, interrupts
    Lifecycle,
    /// Card draws, prompts, selections and resolutions
    Round,
    /// Countdown ticks, drift and suspension
    Timer,
}

/// Synchronous listener. Compared by pointer identity on removal.
pub type Listener = Arc<dyn Fn(&BattleEvent) + Send + Sync>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("invalid payload for event '{name}': {source}")]
    InvalidPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Event bus shared by the battle machine, renderers and readiness gates.
///
/// `emit` is synchronous: every listener registered for the event's kind runs
/// to completion, in registration order, before `emit` returns. A panicking
/// listener is logged and skipped; the remaining listeners still run. After
/// the listeners, the event is forwarded to async subscribers, which may lag.
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<EventKind, Vec<Listener>>>>,
    broadcast: broadcast::Sender<BattleEvent>,
}

impl EventBus {
    /// Creates a new event bus with default broadcast capacity
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with the given broadcast capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            broadcast,
        }
    }

    /// Registers `listener` for `kind` and returns the stored handle, which
    /// is what [`EventBus::off`] expects.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Listener
    where
        F: Fn(&BattleEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.add_listener(kind, Arc::clone(&listener));
        listener
    }

    /// Registers an existing handle. The same handle may be registered more
    /// than once and then runs once per registration.
    pub fn add_listener(&self, kind: EventKind, listener: Listener) {
        self.lock().entry(kind).or_default().push(listener);
    }

    /// Removes one registration of `listener` for `kind`. Unknown listeners
    /// are ignored.
    pub fn off(&self, kind: EventKind, listener: &Listener) {
        let mut listeners = self.lock();
        if let Some(list) = listeners.get_mut(&kind)
            && let Some(index) = list.iter().position(|l| Arc::ptr_eq(l, listener))
        {
            list.remove(index);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Removes every listener. Async subscribers are unaffected.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Delivers `event` to its listeners, then to async subscribers.
    pub fn emit(&self, event: BattleEvent) {
        let kind = event.kind();

        // Listeners registered or removed while emitting apply from the next emit.
        let snapshot: Vec<Listener> = self.lock().get(&kind).cloned().unwrap_or_default();

        for listener in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(&event)));
            if outcome.is_err() {
                tracing::warn!(
                    target: "runtime::events",
                    event = kind.name(),
                    "listener panicked; continuing with remaining listeners"
                );
            }
        }

        if self.broadcast.send(event).is_err() {
            tracing::trace!(target: "runtime::events", event = kind.name(), "no async subscribers");
        }
    }

    /// Emits an event given by name with an untyped payload.
    ///
    /// The payload is validated against the typed event before anything is
    /// delivered; a mismatch is reported to the caller and nothing is emitted.
    pub fn emit_named(&self, name: &str, detail: serde_json::Value) -> Result<(), BusError> {
        if EventKind::from_name(name).is_none() {
            return Err(BusError::UnknownEvent(name.to_string()));
        }

        let raw = serde_json::json!({ "event": name, "detail": detail });
        let event: BattleEvent =
            serde_json::from_value(raw).map_err(|source| BusError::InvalidPayload {
                name: name.to_string(),
                source,
            })?;

        self.emit(event);
        Ok(())
    }

    /// Subscribes to every event.
    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.broadcast.subscribe()
    }

    /// Subscribes to events of the given topics only.
    ///
    /// All topics share one channel, so the relative order of events is the
    /// emission order.
    pub fn subscribe_topics(&self, topics: &[Topic]) -> EventStream {
        EventStream {
            rx: self.broadcast.subscribe(),
            topics: topics.to_vec(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Listener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            broadcast: self.broadcast.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Async receiver filtered to a set of topics.
pub struct EventStream {
    rx: broadcast::Receiver<BattleEvent>,
    topics: Vec<Topic>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Result<BattleEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if self.topics.contains(&event.topic()) {
                return Ok(event);
            }
        }
    }
}
