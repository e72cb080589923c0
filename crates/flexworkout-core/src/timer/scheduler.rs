//! Cancellable timers over a virtual clock.
//!
//! Nothing here sleeps. The owner advances the clock (by simulated time in
//! tests, by wall-clock elapsed time in the CLI) and dispatches whatever
//! timers came due, in deadline order.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::narration::{Owner, SpeechToken};

/// Opaque handle returned when a timer is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What a timer means when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Once-per-second countdown tick.
    Tick(Owner),
    /// Delayed narration after a transition cue.
    Narrate(Owner),
    /// Second tone of a double-cue.
    SecondCue,
    /// An utterance with a known length has finished.
    SpeechDone(SpeechToken),
}

/// Timer scheduling capability consumed by the engines.
pub trait Scheduler {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Duration;

    fn schedule_once(&mut self, delay: Duration, wake: Wake) -> TimerHandle;

    fn schedule_repeating(&mut self, interval: Duration, wake: Wake) -> TimerHandle;

    /// Cancel a timer. Unknown, fired or already cancelled handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug)]
struct Pending {
    handle: TimerHandle,
    wake: Wake,
    every_ms: Option<u64>,
}

/// Deterministic timer queue on a virtual millisecond clock.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_handle: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), Pending>,
    index: HashMap<TimerHandle, (u64, u64)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// Time remaining until the earliest armed timer fires.
    pub fn until_next(&self) -> Option<Duration> {
        self.queue
            .keys()
            .next()
            .map(|(deadline, _)| Duration::from_millis(deadline.saturating_sub(self.now_ms)))
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are re-armed before returning.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, Wake)> {
        let until_ms = millis(until);
        let key = *self.queue.keys().next()?;
        if key.0 > until_ms {
            return None;
        }
        let pending = self.queue.remove(&key)?;
        self.index.remove(&pending.handle);
        self.now_ms = self.now_ms.max(key.0);

        if let Some(every) = pending.every_ms {
            self.insert(key.0.saturating_add(every), pending.handle, pending.wake, Some(every));
        }
        Some((pending.handle, pending.wake))
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now_ms = self.now_ms.max(millis(now));
    }

    fn insert(&mut self, deadline: u64, handle: TimerHandle, wake: Wake, every_ms: Option<u64>) {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(
            key,
            Pending {
                handle,
                wake,
                every_ms,
            },
        );
        self.index.insert(handle, key);
    }

    fn allocate(&mut self) -> TimerHandle {
        self.next_handle += 1;
        TimerHandle(self.next_handle)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }

    fn schedule_once(&mut self, delay: Duration, wake: Wake) -> TimerHandle {
        let handle = self.allocate();
        let deadline = self.now_ms.saturating_add(millis(delay));
        self.insert(deadline, handle, wake, None);
        handle
    }

    fn schedule_repeating(&mut self, interval: Duration, wake: Wake) -> TimerHandle {
        let handle = self.allocate();
        let every = millis(interval).max(1);
        self.insert(self.now_ms.saturating_add(every), handle, wake, Some(every));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(key) = self.index.remove(&handle) {
            self.queue.remove(&key);
        }
    }
}
