use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use runtime::events::{CountdownFinished, RoundPrompt};
use runtime::{BattleEvent, BusError, EventBus, EventKind, Listener};

fn prompt(round: u32) -> BattleEvent {
    BattleEvent::RoundPrompt(RoundPrompt {
        round,
        stats: vec!["power".into()],
        remaining_secs: 30,
    })
}

/// A panicking listener does not stop later listeners or the emitter.
#[test]
fn panicking_listener_is_isolated() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));

    bus.on(EventKind::RoundPrompt, |_| panic!("renderer blew up"));
    {
        let calls = Arc::clone(&calls);
        bus.on(EventKind::RoundPrompt, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    bus.emit(prompt(1));
    bus.emit(prompt(2));

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn listeners_run_in_registration_order_before_emit_returns() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        bus.on(EventKind::RoundPrompt, move |_| {
            order.lock().unwrap().push(name)
        });
    }

    bus.emit(prompt(1));
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn listener_registered_during_emit_applies_from_next_emit() {
    let bus = EventBus::new();
    let late_calls = Arc::new(AtomicUsize::new(0));

    {
        let bus_in = bus.clone();
        let late_calls = Arc::clone(&late_calls);
        bus.on(EventKind::RoundPrompt, move |_| {
            let late_calls = Arc::clone(&late_calls);
            bus_in.on(EventKind::RoundPrompt, move |_| {
                late_calls.fetch_add(1, Ordering::SeqCst);
            });
        });
    }

    bus.emit(prompt(1));
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    bus.emit(prompt(2));
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn emit_named_validates_before_delivering() {
    let bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let listener: Listener = {
        let seen = Arc::clone(&seen);
        Arc::new(move |event: &BattleEvent| seen.lock().unwrap().push(event.clone()))
    };
    bus.add_listener(EventKind::CountdownFinished, Arc::clone(&listener));

    let unknown = bus.emit_named("countdownExploded", serde_json::json!({}));
    assert!(matches!(unknown, Err(BusError::UnknownEvent(name)) if name == "countdownExploded"));

    let invalid = bus.emit_named("countdownFinished", serde_json::json!({ "round": "two" }));
    assert!(matches!(invalid, Err(BusError::InvalidPayload { .. })));
    assert!(seen.lock().unwrap().is_empty());

    bus.emit_named(
        "countdownFinished",
        serde_json::json!({ "round": 2, "skipped": true }),
    )
    .expect("valid payload");
    assert_eq!(
        *seen.lock().unwrap(),
        vec![BattleEvent::CountdownFinished(CountdownFinished {
            round: 2,
            skipped: true,
        })]
    );

    bus.off(EventKind::CountdownFinished, &listener);
    bus.emit_named(
        "countdownFinished",
        serde_json::json!({ "round": 3, "skipped": false }),
    )
    .expect("valid payload");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn reset_drops_all_listeners() {
    let bus = EventBus::new();
    bus.on(EventKind::RoundPrompt, |_| {});
    bus.on(EventKind::MatchConcluded, |_| {});

    bus.reset();

    assert_eq!(bus.listener_count(EventKind::RoundPrompt), 0);
    assert_eq!(bus.listener_count(EventKind::MatchConcluded), 0);
}
