// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Timer: the timer queue and background clock thread.
//!
//! ## Overview
//!
//! Two pieces, deliberately decoupled:
//!
//! - [`TimerQueue`]: a sorted collection of pending one-shot/repeating
//!   callbacks keyed by next-fire timestamp. Owned by a window and touched
//!   only on the UI thread. Repeating timers reschedule on the grid laid down
//!   at creation time, so late delivery never accumulates drift.
//! - [`TimerThread`]: a background thread that sleeps until the earliest
//!   known deadline and then invokes a wake callback. The callback must only
//!   enqueue a wake message onto the UI queue; the queue's
//!   [`TimerQueue::notify`] and any resulting layout/draw happen back on the
//!   UI thread once that message is pumped.
//!
//! Timestamps are milliseconds since an arbitrary process-local epoch; use
//! [`now_millis`] wherever real time is needed so the two sides agree.

use std::sync::OnceLock;
use std::time::Instant;

pub mod queue;
pub mod thread;

pub use queue::{TimerHandler, TimerId, TimerQueue};
pub use thread::TimerThread;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Milliseconds elapsed on the process-local monotonic clock.
pub fn now_millis() -> u64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "u64 milliseconds cover far beyond any process lifetime."
    )]
    {
        EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u64
    }
}
