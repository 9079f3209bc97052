// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sorted timer queue with lazy cancellation and drift-free rescheduling.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier for a scheduled timer, unique for the whole process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Timer callback. Receives the current timestamp; returning `false` cancels
/// the timer, `true` reschedules it one interval further along its grid.
pub type TimerHandler = Box<dyn FnMut(u64) -> bool>;

struct Entry {
    id: TimerId,
    /// Creation timestamp; the reschedule grid is anchored here.
    epoch: u64,
    interval: u64,
    next: u64,
    valid: bool,
    handler: TimerHandler,
}

impl core::fmt::Debug for Entry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("epoch", &self.epoch)
            .field("interval", &self.interval)
            .field("next", &self.next)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

/// Pending timers sorted by `(validity, next fire time)`.
///
/// Cancelled entries sort last and are purged lazily on the next
/// [`TimerQueue::notify`]; cancellation never needs to wake anything.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<Entry>,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a repeating timer.
    ///
    /// The first fire is due at `now + interval_ms`; subsequent fires stay on
    /// the `now + k * interval_ms` grid for as long as the handler keeps
    /// returning `true`.
    pub fn add(&mut self, now: u64, interval_ms: u64, handler: TimerHandler) -> TimerId {
        debug_assert!(interval_ms > 0, "timer interval must be non-zero");
        let interval = interval_ms.max(1);
        let id = TimerId::next();
        self.entries.push(Entry {
            id,
            epoch: now,
            interval,
            next: now + interval,
            valid: true,
            handler,
        });
        self.resort();
        id
    }

    /// Cancel a timer. Returns `false` when the id is unknown (already fired
    /// its last tick, or cancelled before).
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            tracing::debug!(?id, "cancel for unknown timer id");
            return false;
        };
        let was_valid = entry.valid;
        entry.valid = false;
        self.resort();
        was_valid
    }

    /// Fire every due timer.
    ///
    /// Invokes the handler of every valid entry with `next <= now`. A handler
    /// returning `false` cancels its timer; `true` reschedules it to the next
    /// grid point strictly after `now`, never to `now + interval`, so delayed
    /// delivery does not drift the schedule. Returns whether at least one
    /// handler fired; callers use this to decide whether a redraw is
    /// warranted.
    pub fn notify(&mut self, now: u64) -> bool {
        self.purge();
        let mut fired = false;
        // Due entries form a prefix of the sorted list.
        for entry in &mut self.entries {
            if entry.next > now {
                break;
            }
            fired = true;
            if (entry.handler)(now) {
                let ticks = (now - entry.epoch) / entry.interval + 1;
                entry.next = entry.epoch + ticks * entry.interval;
            } else {
                entry.valid = false;
            }
        }
        self.purge();
        self.resort();
        fired
    }

    /// Earliest pending valid deadline, or `None` when the queue is idle.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().find(|e| e.valid).map(|e| e.next)
    }

    /// Number of valid pending timers.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    /// Whether no valid timer is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(&mut self) {
        self.entries.retain(|e| e.valid);
    }

    fn resort(&mut self) {
        self.entries.sort_by_key(|e| (!e.valid, e.next));
    }
}
