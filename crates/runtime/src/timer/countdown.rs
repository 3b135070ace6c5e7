use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::{TimerCategory, TimerHandle, TimerSettings};

type TickFn = Box<dyn Fn(u32) + Send + Sync>;
type ExpiredFn = Box<dyn FnOnce() + Send>;
type DriftFn = Box<dyn Fn(u32, Duration) + Send + Sync>;

/// Callbacks driven by a [`CountdownTimer`]. They are invoked outside the
/// timer's lock and may call back into the timer.
pub struct CountdownCallbacks {
    on_tick: TickFn,
    on_expired: ExpiredFn,
    on_drift: Option<DriftFn>,
}

impl CountdownCallbacks {
    pub fn new(
        on_tick: impl Fn(u32) + Send + Sync + 'static,
        on_expired: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            on_tick: Box::new(on_tick),
            on_expired: Box::new(on_expired),
            on_drift: None,
        }
    }

    /// Called with the remaining seconds and the observed lag when a tick
    /// arrives later than the drift threshold.
    pub fn on_drift(mut self, on_drift: impl Fn(u32, Duration) + Send + Sync + 'static) -> Self {
        self.on_drift = Some(Box::new(on_drift));
        self
    }
}

#[derive(Debug)]
struct Shared {
    remaining: u32,
    paused: bool,
    stopped: bool,
    expired: bool,
}

/// A whole-second countdown.
///
/// Ticks report `duration, duration - 1, ..., 0`; `on_expired` fires exactly
/// once right after the zero tick. Callbacks run on the timer's own task
/// with no internal lock held, so they may query or stop the timer itself.
/// A callback that has not started when [`CountdownTimer::stop`] is called
/// never runs.
pub struct CountdownTimer {
    category: TimerCategory,
    shared: Arc<Mutex<Shared>>,
    paused_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Starts counting down from `duration_secs`. Must be called from within
    /// a Tokio runtime.
    pub fn start(
        category: TimerCategory,
        duration_secs: u32,
        settings: TimerSettings,
        callbacks: CountdownCallbacks,
    ) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            remaining: duration_secs,
            paused: false,
            stopped: false,
            expired: false,
        }));
        let (paused_tx, paused_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            category,
            Arc::clone(&shared),
            paused_rx,
            settings,
            callbacks,
        ));

        tracing::debug!(
            target: "runtime::timer",
            %category,
            duration_secs,
            "countdown started"
        );

        Self {
            category,
            shared,
            paused_tx,
            task,
        }
    }

    pub fn category(&self) -> TimerCategory {
        self.category
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.shared).remaining
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.shared).paused
    }

    /// True once the timer has expired or been stopped.
    pub fn is_finished(&self) -> bool {
        let shared = lock(&self.shared);
        shared.stopped || shared.expired
    }

    pub fn snapshot(&self) -> TimerHandle {
        let shared = lock(&self.shared);
        TimerHandle {
            category: self.category,
            remaining_secs: shared.remaining,
            paused: shared.paused,
        }
    }

    /// Suspends ticking. The interval in progress is discarded and restarts
    /// in full on resume.
    pub fn pause(&self) {
        let mut shared = lock(&self.shared);
        if shared.stopped || shared.expired || shared.paused {
            return;
        }
        shared.paused = true;
        self.paused_tx.send_replace(true);
    }

    pub fn resume(&self) {
        let mut shared = lock(&self.shared);
        if !shared.paused {
            return;
        }
        shared.paused = false;
        self.paused_tx.send_replace(false);
    }

    /// Stops the countdown. Safe to call any number of times; after the first
    /// call no callback fires.
    pub fn stop(&self) {
        let mut shared = lock(&self.shared);
        if shared.stopped {
            return;
        }
        shared.stopped = true;
        drop(shared);
        self.task.abort();
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run(
    category: TimerCategory,
    shared: Arc<Mutex<Shared>>,
    mut paused_rx: watch::Receiver<bool>,
    settings: TimerSettings,
    callbacks: CountdownCallbacks,
) {
    let CountdownCallbacks {
        on_tick,
        on_expired,
        on_drift,
    } = callbacks;

    match current(&shared) {
        Some(remaining) => on_tick(remaining),
        None => return,
    }

    let interval = settings.tick_interval;
    let mut deadline = Instant::now() + interval;

    loop {
        let remaining = lock(&shared).remaining;
        if remaining == 0 {
            break;
        }

        if *paused_rx.borrow_and_update() {
            if paused_rx.changed().await.is_err() {
                return;
            }
            if !*paused_rx.borrow() {
                deadline = Instant::now() + interval;
            }
            continue;
        }

        tokio::select! {
            _ = time::sleep_until(deadline) => {}
            changed = paused_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
        }

        let now = Instant::now();
        let lag = now.saturating_duration_since(deadline);

        let remaining = {
            let mut guard = lock(&shared);
            if guard.stopped {
                return;
            }
            guard.remaining -= 1;
            guard.remaining
        };
        on_tick(remaining);

        if lag > settings.drift_threshold {
            tracing::warn!(
                target: "runtime::timer",
                %category,
                remaining,
                lag_ms = lag.as_millis() as u64,
                "countdown drift detected; re-basing schedule"
            );
            if let Some(on_drift) = &on_drift
                && current(&shared).is_some()
            {
                on_drift(remaining, lag);
            }
            deadline = now + interval;
        } else {
            deadline += interval;
        }
    }

    {
        let mut guard = lock(&shared);
        if guard.stopped {
            return;
        }
        guard.expired = true;
    }
    on_expired();

    tracing::debug!(target: "runtime::timer", %category, "countdown expired");
}

/// Remaining seconds, or `None` once the timer has been stopped.
fn current(shared: &Mutex<Shared>) -> Option<u32> {
    let guard = lock(shared);
    (!guard.stopped).then_some(guard.remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn settings() -> TimerSettings {
        TimerSettings {
            tick_interval: Duration::from_secs(1),
            drift_threshold: Duration::from_secs(2),
        }
    }

    fn recording() -> (
        CountdownCallbacks,
        Arc<Mutex<Vec<u32>>>,
        Arc<Mutex<u32>>,
    ) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let expired = Arc::new(Mutex::new(0));
        let callbacks = {
            let ticks = Arc::clone(&ticks);
            let expired = Arc::clone(&expired);
            CountdownCallbacks::new(
                move |remaining| ticks.lock().unwrap().push(remaining),
                move || *expired.lock().unwrap() += 1,
            )
        };
        (callbacks, ticks, expired)
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_zero_then_expires_once() {
        let (callbacks, ticks, expired) = recording();
        let timer = CountdownTimer::start(TimerCategory::Round, 3, settings(), callbacks);

        time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![3, 2, 1, 0]);
        assert_eq!(*expired.lock().unwrap(), 1);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_callbacks_and_is_idempotent() {
        let (callbacks, ticks, expired) = recording();
        let timer = CountdownTimer::start(TimerCategory::Cooldown, 5, settings(), callbacks);

        time::sleep(Duration::from_millis(1_500)).await;
        timer.stop();
        timer.stop();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![5, 4]);
        assert_eq!(*expired.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_restarts_the_partial_interval() {
        let (callbacks, ticks, _expired) = recording();
        let timer = CountdownTimer::start(TimerCategory::Round, 5, settings(), callbacks);

        time::sleep(Duration::from_millis(1_500)).await;
        timer.pause();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![5, 4]);
        assert!(timer.snapshot().paused);

        timer.resume();
        time::sleep(Duration::from_millis(900)).await;
        assert_eq!(timer.remaining(), 4);
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(timer.remaining(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_immediately() {
        let (callbacks, ticks, expired) = recording();
        let _timer = CountdownTimer::start(TimerCategory::Cooldown, 0, settings(), callbacks);

        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![0]);
        assert_eq!(*expired.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_tick_reports_drift_and_rebases_schedule() {
        let (callbacks, ticks, _expired) = recording();
        let drifts = Arc::new(Mutex::new(Vec::new()));
        let callbacks = {
            let drifts = Arc::clone(&drifts);
            callbacks.on_drift(move |remaining, lag| {
                drifts.lock().unwrap().push((remaining, lag));
            })
        };
        let timer = CountdownTimer::start(TimerCategory::Round, 30, settings(), callbacks);

        time::sleep(Duration::from_millis(100)).await;
        time::advance(Duration::from_secs(5)).await;
        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*ticks.lock().unwrap(), vec![30, 29]);
        let drifts = drifts.lock().unwrap().clone();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].0, 29);
        assert!(drifts[0].1 >= Duration::from_secs(2));

        // The next tick is one interval after the late one, not after the
        // original deadline.
        time::sleep(Duration::from_millis(890)).await;
        assert_eq!(timer.remaining(), 29);
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*ticks.lock().unwrap(), vec![30, 29, 28]);
    }

    #[tokio::test(start_paused = true)]
    async fn callbacks_may_query_and_stop_their_own_timer() {
        let slot: Arc<OnceLock<CountdownTimer>> = Arc::new(OnceLock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let expired = Arc::new(Mutex::new(0));
        let callbacks = {
            let slot = Arc::clone(&slot);
            let seen = Arc::clone(&seen);
            let expired = Arc::clone(&expired);
            CountdownCallbacks::new(
                move |remaining| {
                    let Some(timer) = slot.get() else { return };
                    let observed = timer.snapshot().remaining_secs;
                    seen.lock().unwrap().push((remaining, observed));
                    if remaining == 3 {
                        timer.stop();
                    }
                },
                move || *expired.lock().unwrap() += 1,
            )
        };
        let timer = CountdownTimer::start(TimerCategory::Round, 5, settings(), callbacks);
        assert!(slot.set(timer).is_ok());

        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*seen.lock().unwrap(), vec![(5, 5), (4, 4), (3, 3)]);
        assert_eq!(*expired.lock().unwrap(), 0);
        assert!(slot.get().is_some_and(CountdownTimer::is_finished));
    }
}
