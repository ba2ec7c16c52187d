//! Delayed work for the render thread.
//!
//! Staggered gauge updates must land on the thread that owns the UI state.
//! Instead of spawning timers, the app queues them here and drains whatever
//! is due once per frame.

use std::time::{Duration, Instant};

/// Queue of values that become due at a given instant.
#[derive(Debug)]
pub struct Deferred<T> {
    // sorted by due time; equal due times keep insertion order
    pending: Vec<(Instant, T)>,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> Deferred<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item` to become due `delay` after `now`.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, item: T) {
        let due = now + delay;
        let index = self.pending.partition_point(|(at, _)| *at <= due);
        self.pending.insert(index, (due, item));
    }

    /// Remove and return every item due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let split = self.pending.partition_point(|(at, _)| *at <= now);
        self.pending.drain(..split).map(|(_, item)| item).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
