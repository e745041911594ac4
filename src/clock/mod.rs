//! Clock - virtual time for the effect scheduler
//!
//! Every effect in the theme is a timer. Instead of handing callbacks to the
//! host, the scheduler keeps its own registry and the host only reports how
//! much time has passed.
//!
//! # Architecture
//!
//! ```text
//! Host loop (setInterval / rAF / tokio interval)
//!     │  advance(dt)
//!     ▼
//! Timers<Task> (registry)
//!     ├── recurring: static-render, element-corrupt, page-corrupt,
//!     │              text-corrupt, subliminal-rotate, escalation-tick
//!     └── one-shot:  reversals, fades, removals
//!     │  pop_due(until) in due order
//!     ▼
//! EffectScheduler runs the task
//!     │
//!     └── escalation-tick advances SessionClock by one tick
//! ```
//!
//! # Two Clocks
//!
//! | Clock | Struct | Advances | Used for |
//! |-------|--------|----------|----------|
//! | Registry time | `Timers::now_ms` | every `advance` | due times of all tasks |
//! | Session clock | `SessionClock` | per escalation tick | escalation gates |
//!
//! The session clock only moves while escalation is running, so a theme with
//! escalation disabled never escalates no matter how long the page is open.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::core::chance::Chance;

/// Elapsed time on page, in whole ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    elapsed_ms: u64,
    tick_ms: u64,
}

impl SessionClock {
    pub fn new(tick_ms: u64) -> Self {
        Self { elapsed_ms: 0, tick_ms }
    }

    /// Advance by one tick and return the new elapsed time
    pub fn tick(&mut self) -> u64 {
        self.elapsed_ms += self.tick_ms;
        self.elapsed_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }

    #[cfg(test)]
    pub(crate) fn set_elapsed(&mut self, ms: u64) {
        self.elapsed_ms = ms;
    }
}

/// Handle to a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(u64);

/// How often a recurring timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Fixed(u64),
    /// `base + U(0, spread)`, drawn again for every firing
    Jittered { base_ms: u64, spread_ms: u64 },
}

impl Cadence {
    pub fn next_delay(&self, chance: &mut dyn Chance) -> u64 {
        let delay = match *self {
            Cadence::Fixed(ms) => ms,
            Cadence::Jittered { base_ms, spread_ms } => base_ms + chance.jitter(spread_ms),
        };
        // A zero period would spin forever inside a single advance
        delay.max(1)
    }
}

/// What a recurring timer does when one `pop_due` window covers several of
/// its periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Missed {
    /// Run every missed period, in due order
    #[default]
    Replay,
    /// Run once, at the latest period inside the window
    Skip,
}

struct Entry<T> {
    task: T,
    cadence: Option<(Cadence, Missed)>,
}

/// Registry of recurring and one-shot tasks keyed by due time.
///
/// Ties on due time run in registration order.
pub struct Timers<T> {
    now_ms: u64,
    next_id: u64,
    queue: BTreeMap<(u64, TimerId), Entry<T>>,
    due: HashMap<TimerId, u64>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self { now_ms: 0, next_id: 0, queue: BTreeMap::new(), due: HashMap::new() }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due.contains_key(&id)
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Run `task` once, `delay_ms` from now
    pub fn once(&mut self, delay_ms: u64, task: T) -> TimerId {
        self.insert(self.now_ms + delay_ms, Entry { task, cadence: None })
    }

    /// Run `task` repeatedly; the first firing is one period from now
    pub fn every(&mut self, cadence: Cadence, task: T, chance: &mut dyn Chance) -> TimerId {
        self.every_with(cadence, Missed::Replay, task, chance)
    }

    pub fn every_with(
        &mut self,
        cadence: Cadence,
        missed: Missed,
        task: T,
        chance: &mut dyn Chance,
    ) -> TimerId {
        let due = self.now_ms + cadence.next_delay(chance);
        self.insert(due, Entry { task, cadence: Some((cadence, missed)) })
    }

    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due = self.due.remove(&id)?;
        self.queue.remove(&(due, id)).map(|entry| entry.task)
    }

    /// Move registry time forward without running anything
    pub fn settle_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Drop every task. One-shot tasks are returned in due order, recurring
    /// ones are discarded.
    pub fn drain_once(&mut self) -> Vec<T> {
        self.due.clear();
        std::mem::take(&mut self.queue)
            .into_values()
            .filter(|entry| entry.cadence.is_none())
            .map(|entry| entry.task)
            .collect()
    }

    fn insert(&mut self, due: u64, entry: Entry<T>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((due, id), entry);
        self.due.insert(id, due);
        id
    }
}

impl<T: Clone> Timers<T> {
    /// Pop the earliest task due at or before `until_ms` and move registry
    /// time to its due time. Recurring tasks are re-armed under the same id.
    ///
    /// A [`Missed::Skip`] timer that is more than one period behind is moved
    /// to its latest period inside the window first, so it fires once.
    pub fn pop_due(&mut self, until_ms: u64, chance: &mut dyn Chance) -> Option<(TimerId, T)> {
        loop {
            let (&(due, id), entry) = self.queue.iter().next()?;
            if due > until_ms {
                return None;
            }
            if let Some((cadence, Missed::Skip)) = entry.cadence {
                let period = cadence.next_delay(chance);
                let latest = due + (until_ms - due) / period * period;
                if latest > due {
                    if let Some(entry) = self.queue.remove(&(due, id)) {
                        self.queue.insert((latest, id), entry);
                        self.due.insert(id, latest);
                    }
                    continue;
                }
            }

            let entry = self.queue.remove(&(due, id))?;
            self.due.remove(&id);
            self.now_ms = self.now_ms.max(due);

            if let Some((cadence, missed)) = entry.cadence {
                let next = self.now_ms + cadence.next_delay(chance);
                let rearmed = Entry { task: entry.task.clone(), cadence: Some((cadence, missed)) };
                self.queue.insert((next, id), rearmed);
                self.due.insert(id, next);
            }
            return Some((id, entry.task));
        }
    }
}
