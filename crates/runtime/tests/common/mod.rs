#![allow(dead_code)]

use std::future::IntoFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use battle_core::{Contestant, ContestantPair, Stat};
use runtime::{
    BattleEvent, BattleHandle, ContestantSource, EventBus, EventKind, FixedSettings, Runtime,
    RuntimeConfig, TransitionLog,
};
use strum::IntoEnumIterator;

pub fn card(id: &str, stats: &[(&str, i32)]) -> Contestant {
    Contestant::new(
        id,
        id.to_uppercase(),
        stats.iter().map(|(k, v)| Stat::new(*k, *v)).collect(),
    )
}

/// Player card beats the opponent on "power" and loses on "speed".
pub fn pair() -> ContestantPair {
    ContestantPair::new(
        card("hero", &[("power", 5), ("speed", 3)]),
        card("rival", &[("power", 3), ("speed", 7)]),
    )
}

pub fn config() -> RuntimeConfig {
    RuntimeConfig {
        round_timer_secs: 30,
        cooldown_secs: 3,
        ..RuntimeConfig::default()
    }
}

pub struct Harness {
    pub runtime: Runtime,
    pub handle: BattleHandle,
    pub log: Arc<TransitionLog>,
    pub events: Arc<Mutex<Vec<BattleEvent>>>,
}

pub async fn start(
    config: RuntimeConfig,
    source: impl ContestantSource + 'static,
    target: i64,
) -> Harness {
    let log = Arc::new(TransitionLog::new());
    let runtime = Runtime::builder()
        .config(config)
        .contestant_source(source)
        .settings(FixedSettings::new(target))
        .diagnostics(log.clone())
        .build()
        .await
        .expect("runtime should build");
    let handle = runtime.handle();
    let events = record(handle.event_bus());

    Harness {
        runtime,
        handle,
        log,
        events,
    }
}

/// Records every event emitted on `bus`, in emission order.
pub fn record(bus: &EventBus) -> Arc<Mutex<Vec<BattleEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::iter() {
        let events = Arc::clone(&events);
        bus.on(kind, move |event| events.lock().unwrap().push(event.clone()));
    }
    events
}

pub fn kinds(events: &Mutex<Vec<BattleEvent>>, filter: &[EventKind]) -> Vec<EventKind> {
    events
        .lock()
        .unwrap()
        .iter()
        .map(BattleEvent::kind)
        .filter(|kind| filter.contains(kind))
        .collect()
}

/// Awaits `fut`, failing the test if the battle stalls.
pub async fn within<F: IntoFuture>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(600), fut.into_future())
        .await
        .expect("battle stalled")
}

/// Waits for the next event of `kind` on a fresh subscription.
pub async fn next_of(
    rx: &mut tokio::sync::broadcast::Receiver<BattleEvent>,
    kind: EventKind,
) -> BattleEvent {
    within(async {
        loop {
            let event = rx.recv().await.expect("event stream closed");
            if event.kind() == kind {
                return event;
            }
        }
    })
    .await
}
