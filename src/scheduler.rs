//! Deferred execution.
//!
//! The scheduler runs on a virtual clock that the host advances with ticks, so timers fire
//! deterministically and always on the UI thread.

use core::fmt;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::trace;

type Callback = Box<dyn FnOnce() + Send>;

/// Handle to a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Timers {
    now: Duration,
    seq: u64,
    queue: BTreeMap<(Duration, u64), Callback>,
    index: HashMap<u64, Duration>,
}

pub struct Scheduler {
    timers: Mutex<Timers>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler {
            timers: Mutex::new(Timers {
                now: Duration::from_millis(0),
                seq: 0,
                queue: BTreeMap::new(),
                index: HashMap::new(),
            }),
        }
    }

    /// Runs `f` once `delay` has elapsed on the scheduler clock.
    pub fn yield_after<F: 'static + FnOnce() + Send>(&self, delay: Duration, f: F) -> TimerHandle {
        let mut timers = self.timers.lock();
        timers.seq += 1;
        let seq = timers.seq;
        let due = timers.now + delay;
        timers.queue.insert((due, seq), Box::new(f));
        timers.index.insert(seq, due);
        TimerHandle(seq)
    }

    /// Cancels a timer. Returns false if it already ran or was cancelled.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let mut timers = self.timers.lock();
        match timers.index.remove(&handle.0) {
            Some(due) => timers.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }

    /// Advances the clock, running due timers in order.
    ///
    /// Timers scheduled by callbacks run in the same call if they fall due before the new time.
    pub fn advance(&self, dt: Duration) {
        let target = self.timers.lock().now + dt;
        loop {
            let callback = {
                let mut timers = self.timers.lock();
                let key = match timers.queue.keys().next() {
                    Some(key) if key.0 <= target => *key,
                    _ => break,
                };
                timers.index.remove(&key.1);
                timers.now = key.0;
                timers.queue.remove(&key)
            };
            if let Some(callback) = callback {
                callback();
            }
        }
        let mut timers = self.timers.lock();
        trace!(now = ?target, pending = timers.queue.len(), "advance");
        timers.now = target;
    }

    /// Runs every pending timer, including ones scheduled along the way.
    pub fn run_until_idle(&self) {
        loop {
            let next = self.timers.lock().queue.keys().next().map(|key| key.0);
            match next {
                Some(due) => {
                    let now = self.now();
                    self.advance(due.checked_sub(now).unwrap_or_default());
                }
                None => break,
            }
        }
    }

    pub fn now(&self) -> Duration {
        self.timers.lock().now
    }

    /// Number of timers that haven't run yet.
    pub fn pending(&self) -> usize {
        self.timers.lock().queue.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let timers = self.timers.lock();
        f.debug_struct("Scheduler")
            .field("now", &timers.now)
            .field("pending", &timers.queue.len())
            .finish()
    }
}
