// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background clock thread.
//!
//! One thread per window sleeps until the earliest armed deadline and then
//! invokes the window's wake callback. The callback runs on the clock thread;
//! it must only post a wake message to the UI loop and return.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::now_millis;

#[derive(Debug, Default)]
struct State {
    /// Next wake-up timestamp, if armed.
    deadline: Option<u64>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

/// A clock thread that calls a wake callback at requested timestamps.
///
/// Arming an earlier deadline interrupts the current sleep; arming a later
/// one while an earlier deadline is pending is ignored. Dropping the handle
/// shuts the thread down and joins it.
pub struct TimerThread {
    shared: Arc<Shared>,
    join: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for TimerThread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerThread")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl TimerThread {
    /// Spawn the clock thread. `wake` is invoked on that thread each time an
    /// armed deadline is reached.
    pub fn new(wake: Arc<dyn Fn() + Send + Sync>) -> Self {
        let shared = Arc::new(Shared::default());
        let thread_shared = Arc::clone(&shared);
        let join = std::thread::Builder::new()
            .name("trellis-timer".into())
            .spawn(move || run(&thread_shared, &*wake))
            .expect("failed to spawn timer thread");
        Self {
            shared,
            join: Some(join),
        }
    }

    /// Request a wake-up at `ts` (milliseconds, [`now_millis`] clock).
    ///
    /// Only moves the armed deadline earlier; a pending earlier deadline
    /// already covers the later request, since the wake handler re-arms from
    /// the queue's next deadline after every tick.
    pub fn notify_on(&self, ts: u64) {
        let mut st = self.shared.state.lock().expect("timer state poisoned");
        if st.deadline.is_none_or(|d| ts < d) {
            st.deadline = Some(ts);
            self.shared.cond.notify_one();
        }
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        {
            let mut st = self.shared.state.lock().expect("timer state poisoned");
            st.shutdown = true;
            self.shared.cond.notify_one();
        }
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("timer thread panicked");
        }
    }
}

fn run(shared: &Shared, wake: &(dyn Fn() + Send + Sync)) {
    let mut st = shared.state.lock().expect("timer state poisoned");
    loop {
        if st.shutdown {
            return;
        }
        match st.deadline {
            None => {
                st = shared.cond.wait(st).expect("timer state poisoned");
            }
            Some(deadline) => {
                let now = now_millis();
                if now >= deadline {
                    // Disarm before waking; the handler re-arms as needed.
                    st.deadline = None;
                    drop(st);
                    wake();
                    st = shared.state.lock().expect("timer state poisoned");
                } else {
                    let wait = core::time::Duration::from_millis(deadline - now);
                    let (guard, _timed_out) = shared
                        .cond
                        .wait_timeout(st, wait)
                        .expect("timer state poisoned");
                    st = guard;
                }
            }
        }
    }
}
