//! Whole-second countdowns for the selection window and the inter-round cooldown.

mod countdown;

pub use countdown::{CountdownCallbacks, CountdownTimer};

use core::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which countdown a timer drives. At most one timer per category is active.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerCategory {
    Round,
    Cooldown,
}

impl TimerCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Cooldown => "cooldown",
        }
    }
}

impl fmt::Display for TimerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling parameters shared by every countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub tick_interval: Duration,
    /// Lateness beyond which a tick re-bases the schedule.
    pub drift_threshold: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            drift_threshold: Duration::from_secs(2),
        }
    }
}

/// Point-in-time view of a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerHandle {
    pub category: TimerCategory,
    pub remaining_secs: u32,
    pub paused: bool,
}

struct Slot {
    generation: u64,
    timer: CountdownTimer,
}

/// One countdown per category, tagged with the generation it was started
/// under so late callbacks from a replaced timer can be recognized.
#[derive(Default)]
pub struct Timers {
    round: Option<Slot>,
    cooldown: Option<Slot>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any timer of the same category.
    pub fn start(
        &mut self,
        category: TimerCategory,
        generation: u64,
        duration_secs: u32,
        settings: TimerSettings,
        callbacks: CountdownCallbacks,
    ) {
        self.stop(category);
        let timer = CountdownTimer::start(category, duration_secs, settings, callbacks);
        *self.slot_mut(category) = Some(Slot { generation, timer });
    }

    pub fn stop(&mut self, category: TimerCategory) {
        if let Some(slot) = self.slot_mut(category).take() {
            slot.timer.stop();
        }
    }

    pub fn stop_all(&mut self) {
        self.stop(TimerCategory::Round);
        self.stop(TimerCategory::Cooldown);
    }

    pub fn pause_all(&self) {
        self.slots().for_each(|slot| slot.timer.pause());
    }

    pub fn resume_all(&self) {
        self.slots().for_each(|slot| slot.timer.resume());
    }

    /// Whether `generation` is the live timer of `category`.
    pub fn is_current(&self, category: TimerCategory, generation: u64) -> bool {
        self.slot(category)
            .is_some_and(|slot| slot.generation == generation)
    }

    pub fn is_active(&self, category: TimerCategory) -> bool {
        self.slot(category)
            .is_some_and(|slot| !slot.timer.is_finished())
    }

    pub fn snapshot(&self, category: TimerCategory) -> Option<TimerHandle> {
        self.slot(category).map(|slot| slot.timer.snapshot())
    }

    fn slot(&self, category: TimerCategory) -> Option<&Slot> {
        match category {
            TimerCategory::Round => self.round.as_ref(),
            TimerCategory::Cooldown => self.cooldown.as_ref(),
        }
    }

    fn slot_mut(&mut self, category: TimerCategory) -> &mut Option<Slot> {
        match category {
            TimerCategory::Round => &mut self.round,
            TimerCategory::Cooldown => &mut self.cooldown,
        }
    }

    fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.round.iter().chain(self.cooldown.iter())
    }
}
