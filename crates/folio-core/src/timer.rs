#![forbid(unsafe_code)]

//! Deterministic timer queue driven by the host clock.
//!
//! Nothing here sleeps. Callers schedule payloads at absolute deadlines and
//! drain whatever is due with [`TimerQueue::pop_due`] whenever the host
//! reports that time moved. Timers with equal deadlines fire in scheduling
//! order, so replaying the same inputs always produces the same sequence.

use core::time::Duration;

#[derive(Debug, Clone)]
struct Entry<T> {
    deadline: Duration,
    seq: u64,
    payload: T,
}

/// Pending one-shot timers.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            deadline,
            seq,
            payload,
        });
    }

    /// Remove and return the earliest timer due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<T> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(idx, _)| idx)?;
        Some(self.entries.swap_remove(idx).payload)
    }

    /// Earliest pending deadline, for arming a single platform timeout.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Drop every timer whose payload matches.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.payload));
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
